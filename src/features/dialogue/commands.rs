//! Slash-style commands understood in chat.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Cancel,
    /// Leave a group
    Quit,
    /// Show the repetition schedule
    Items,
    CreateItem,
    /// Run one reminder cycle now (operators)
    Tick,
    /// Application vs database clock
    Time,
    Unknown,
}

impl Command {
    /// `name` is the lowercase command word without the slash
    pub fn parse(name: &str) -> Self {
        match name {
            "start" => Self::Start,
            "help" => Self::Help,
            "cancel" => Self::Cancel,
            "quit" => Self::Quit,
            "items" => Self::Items,
            "create_item" => Self::CreateItem,
            "tick" => Self::Tick,
            "time" => Self::Time,
            _ => Self::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_commands() {
        assert_eq!(Command::parse("start"), Command::Start);
        assert_eq!(Command::parse("create_item"), Command::CreateItem);
        assert_eq!(Command::parse("tick"), Command::Tick);
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(Command::parse("remind"), Command::Unknown);
        assert_eq!(Command::parse(""), Command::Unknown);
    }
}
