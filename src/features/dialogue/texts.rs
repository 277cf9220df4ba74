//! User-facing replies.

use crate::core::models::{format_date, GroupId, Memberships};
use chrono::NaiveDate;

pub const START_NEWCOMER: &str = "Я напоминаю вам, каждый раз, когда приходит время освежить в памяти какие-нибудь карточки\nДавайте начнём!";
pub const HELP: &str = "Я напоминаю о модулях, которые пора повторить.\n\n\
/start - начать работу\n\
/create_item - добавить модуль\n\
/items - расписание повторений\n\
/quit - покинуть группу\n\
/cancel - отменить текущее действие\n\n\
Модуль можно добавить и одним сообщением: \"Я изучаю <название> на Quizlet: <ссылка>\"";
pub const CANCELLED: &str = "Без вопросов";
pub const NOT_UNDERSTOOD: &str = "Не понимаю, что вы имели в виду...";
pub const TRY_AGAIN: &str = "Что-то пошло не так, попробуйте ещё раз";
pub const NOT_IN_GROUP: &str = "Вы не состоите в группе";
pub const LOST_CONTEXT: &str = "Что-то пошло не так... Вернитесь в начало с помощью /cancel";

pub const ASK_NEW_PASSWORD: &str =
    "Придумайте пароль (как минимум 3 символа латиницей или цифрами)";
pub const BAD_NEW_PASSWORD: &str = "Недопустимый пароль, попробуйте другой";
pub const CREATE_GROUP_FAILED: &str = "Не получилось создать группу, попробуйте еще раз";

pub const ASK_GROUP_ID_TO_JOIN: &str = "Введите ID группы, к которой хотите присоединиться";
pub const NOT_A_NUMBER: &str = "Вы точно ввели число?";
pub const GROUP_LOOKUP_FAILED: &str = "Не удалось проверить наличие группы, попробуйте ещё раз";
pub const NO_SUCH_GROUP: &str = "Такой группы не существует, попробуйте ввести другой ID";
pub const ASK_JOIN_PASSWORD: &str = "Хорошо, теперь введите пароль";
pub const BAD_PASSWORD_FORMAT: &str = "Неверный формат пароля, попробуйте ещё раз";
pub const GROUP_VANISHED: &str = "Группа перестала существовать... Вернитесь в начало с помощью /cancel";
pub const WRONG_PASSWORD: &str = "Неверный пароль, попробуйте ещё раз";
pub const JOIN_FAILED: &str = "Не удалось добавить вас в группу, попробуйте ещё раз";

pub const ASK_ITEM_URL: &str = "Новый модуль? Ок... Скиньте ссылку на него";
pub const ASK_ITEM_GROUP: &str = "Новый модуль? Ок... В какую группу вы хотите его добавить?";
pub const BAD_GROUP_CHOICE: &str =
    "Вы уверены, что ввели число без всяких знаков? Повторите, пожалуйста, ещё раз";
pub const ASK_ITEM_URL_AFTER_GROUP: &str = "Отлично! А теперь скиньте ссылку на модуль";
pub const BAD_URL: &str = "Проверьте ссылку, мне кажется, что она неверная";
pub const ASK_ITEM_NAME: &str = "Окей, а теперь введите название модуля";
pub const BAD_ITEM_NAME: &str = "Ухх, плохое название, придумайте другое";
pub const FORGOT_URL: &str =
    "Что-то у меня амнезия... Я ссылку-то уже забыл... Давайте заново? Введите /cancel";
pub const CREATE_ITEM_FAILED: &str = "Тэкс... Я не смогу записать... Повторите, пожалуйста, еще раз...";
pub const ASK_GROUP_FOR_SUBMISSION: &str =
    "Введите номер группы, в которую хотите добавить эту карточку";

pub const ASK_GROUP_TO_LEAVE: &str = "Выберите группу, из которой хотите выйти";
pub const NOT_IN_ANY_GROUP: &str = "Вы не находитесь в группе";
pub const LEAVE_FAILED: &str = "Не удалось выйти из группы, увы :(";

pub const SCHEDULE_FAILED: &str = "Не удалось получить расписание";
pub const SCHEDULE_EMPTY: &str = "Модулей пока нет";

pub const CONFIRMED: &str = "Отлично!";
pub const CONFIRMED_SUFFIX: &str = "\nПовторили!";
pub const CONFIRM_FAILED: &str = "Не получилось отметить повторение, попробуйте ещё раз";
pub const UNKNOWN_BUTTON: &str = "Эта кнопка устарела";

pub const OPERATORS_ONLY: &str = "Эта команда доступна только операторам";
pub const TICKER_OFFLINE: &str = "Планировщик не запущен";
pub const TICK_FAILED: &str = "Тик не удался, загляните в логи";
pub const UNAVAILABLE: &str = "недоступно";

/// `√3, √7`
pub fn group_list(memberships: &Memberships) -> String {
    memberships
        .groups()
        .iter()
        .map(|g| format!("√{}", g.id))
        .collect::<Vec<_>>()
        .join(", ")
}

fn group_noun(memberships: &Memberships) -> &'static str {
    if memberships.len() == 1 {
        "группе"
    } else {
        "группах"
    }
}

pub fn welcome_back(memberships: &Memberships) -> String {
    format!(
        "С возвращением! Вы находитесь в {} {}",
        group_noun(memberships),
        group_list(memberships)
    )
}

pub fn already_member(memberships: &Memberships) -> String {
    format!(
        "Напоминаю, что вы состоите в {} {}",
        group_noun(memberships),
        group_list(memberships)
    )
}

pub fn your_groups(memberships: &Memberships) -> String {
    format!(
        "Вы находитесь в {} {}",
        group_noun(memberships),
        group_list(memberships)
    )
}

pub fn group_created(group_id: GroupId) -> String {
    format!("Отлично, группа создана!\nВы можете пригласить в нее друзей по ID: {group_id}")
}

pub fn joined(group_id: GroupId) -> String {
    format!("Добро пожаловать в группу √{group_id}")
}

pub fn not_member_of(group_id: GroupId) -> String {
    format!("Вы не входите в группу √{group_id}")
}

pub fn left(group_id: GroupId) -> String {
    format!("Вы вышли из группы √{group_id}")
}

pub fn item_added(next_due: NaiveDate) -> String {
    format!(
        "Отлично! Карточка добавлена :)\nПовторим её {}",
        format_date(next_due)
    )
}

pub fn schedule_header(group_id: GroupId) -> String {
    format!("**Расписание группы √{group_id}**")
}

pub fn tick_done(items_due: usize, reminders_sent: usize, failed_sends: usize) -> String {
    format!(
        "Успешный тик\nМодулей к повторению: {items_due}\nНапоминаний отправлено: {reminders_sent}\nНе доставлено: {failed_sends}"
    )
}

pub fn time_report(app_time: &str, database_time: &str) -> String {
    format!("Время в приложении: {app_time}\nВремя в базе данных: {database_time}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Group;

    fn memberships(ids: &[GroupId]) -> Memberships {
        Memberships::new(
            ids.iter()
                .map(|id| Group {
                    id: *id,
                    password_hash: String::new(),
                })
                .collect(),
        )
    }

    #[test]
    fn test_group_wording() {
        assert_eq!(welcome_back(&memberships(&[4])), "С возвращением! Вы находитесь в группе √4");
        assert_eq!(
            already_member(&memberships(&[4, 9])),
            "Напоминаю, что вы состоите в группах √4, √9"
        );
    }

    #[test]
    fn test_item_added_uses_local_date_format() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 11).unwrap();
        assert_eq!(item_added(date), "Отлично! Карточка добавлена :)\nПовторим её 11.04.2025");
    }
}
