/// One line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { username: String, password: String },
    Register { name: String, username: String, password: String },
    Logout,
    List,
    Open(String),
    Older,
    Users,
    New { name: String, members: Vec<String> },
    Help,
    Quit,
    /// Plain text for the open conversation.
    Say(String),
}

pub const HELP: &str = "\
Commands:
  /login <username> <password>            sign in
  /register <name> <username> <password>  create an account
  /logout                                 sign out
  /list                                   show conversations
  /open <number|id>                       open a conversation
  /older                                  load earlier messages
  /users                                  show other users
  /new <name> <user>...                   start a conversation
  /help                                   this text
  /quit                                   exit
Anything else is sent to the open conversation.";

/// `Ok(None)` for blank input, `Err` with a usage hint for malformed commands.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(Command::Say(line.to_string())));
    };
    let mut words = rest.split_whitespace();
    let name = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    let cmd = match (name, args.as_slice()) {
        ("login", [username, password]) => Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        },
        ("login", _) => return Err("usage: /login <username> <password>".into()),
        ("register", [name @ .., username, password]) if !name.is_empty() => Command::Register {
            name: name.join(" "),
            username: username.to_string(),
            password: password.to_string(),
        },
        ("register", _) => return Err("usage: /register <name> <username> <password>".into()),
        ("logout", []) => Command::Logout,
        ("list", []) => Command::List,
        ("open", [key]) => Command::Open(key.to_string()),
        ("open", _) => return Err("usage: /open <number|id>".into()),
        ("older", []) => Command::Older,
        ("users", []) => Command::Users,
        ("new", [name, members @ ..]) if !members.is_empty() => Command::New {
            name: name.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
        },
        ("new", _) => return Err("usage: /new <name> <user>...".into()),
        ("help", _) => Command::Help,
        ("quit" | "exit", _) => Command::Quit,
        _ => return Err(format!("unknown command /{name}, try /help")),
    };
    Ok(Some(cmd))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_plain_text() {
        assert_eq!(parse("   "), Ok(None));
        assert_eq!(parse("  hello world "), Ok(Some(Command::Say("hello world".into()))));
    }

    #[test]
    fn register_joins_name() {
        assert_eq!(
            parse("/register John Doe johndoe password123"),
            Ok(Some(Command::Register {
                name: "John Doe".into(),
                username: "johndoe".into(),
                password: "password123".into(),
            }))
        );
        assert!(parse("/register johndoe password123").is_err());
    }

    #[test]
    fn new_needs_members() {
        assert!(parse("/new team").is_err());
        assert_eq!(
            parse("/new team janesmith alicew"),
            Ok(Some(Command::New {
                name: "team".into(),
                members: vec!["janesmith".into(), "alicew".into()],
            }))
        );
    }

    #[test]
    fn misc() {
        assert_eq!(parse("/open 2"), Ok(Some(Command::Open("2".into()))));
        assert_eq!(parse("/older"), Ok(Some(Command::Older)));
        assert_eq!(parse("/exit"), Ok(Some(Command::Quit)));
        assert!(parse("/login onlyuser").is_err());
        assert!(parse("/frobnicate").is_err());
    }
}
