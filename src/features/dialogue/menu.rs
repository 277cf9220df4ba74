//! Reply-keyboard menu: labels, the actions behind them, and which buttons a
//! user sees.

use crate::transport::{Button, Keyboard};

pub const CREATE_GROUP: &str = "Создать свою группу";
pub const JOIN_GROUP: &str = "Присоединиться к группе";
pub const ADD_MODULE: &str = "Добавить модуль";
pub const SCHEDULE: &str = "Расписание повторений";
pub const LEAVE_GROUP: &str = "Покинуть группу";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    CreateGroup,
    JoinGroup,
    AddModule,
    Schedule,
    LeaveGroup,
}

impl MenuAction {
    /// Map a pressed button's label back to its action
    pub fn from_label(text: &str) -> Option<Self> {
        match text.trim() {
            CREATE_GROUP => Some(Self::CreateGroup),
            JOIN_GROUP => Some(Self::JoinGroup),
            ADD_MODULE => Some(Self::AddModule),
            SCHEDULE => Some(Self::Schedule),
            LEAVE_GROUP => Some(Self::LeaveGroup),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::CreateGroup => CREATE_GROUP,
            Self::JoinGroup => JOIN_GROUP,
            Self::AddModule => ADD_MODULE,
            Self::Schedule => SCHEDULE,
            Self::LeaveGroup => LEAVE_GROUP,
        }
    }
}

/// Menu for someone in `group_count` groups
pub fn keyboard_for(group_count: usize) -> Keyboard {
    if group_count == 0 {
        Keyboard::new(vec![vec![
            Button::reply(CREATE_GROUP),
            Button::reply(JOIN_GROUP),
        ]])
    } else {
        Keyboard::new(vec![
            vec![Button::reply(ADD_MODULE), Button::reply(SCHEDULE)],
            vec![
                Button::reply(CREATE_GROUP),
                Button::reply(JOIN_GROUP),
                Button::reply(LEAVE_GROUP),
            ],
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newcomer_menu() {
        assert_eq!(keyboard_for(0).labels(), vec![CREATE_GROUP, JOIN_GROUP]);
    }

    #[test]
    fn test_member_menu() {
        let keyboard = keyboard_for(2);
        let labels = keyboard.labels();
        assert_eq!(labels.len(), 5);
        assert_eq!(labels[0], ADD_MODULE);
        assert!(labels.contains(&LEAVE_GROUP));
    }

    #[test]
    fn test_labels_round_trip_to_actions() {
        for label in keyboard_for(1).labels() {
            let action = MenuAction::from_label(label).unwrap();
            assert_eq!(action.label(), label);
        }
        assert_eq!(MenuAction::from_label("Chem 101"), None);
    }
}
