use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::types::{PageSize, RecordId, TypeConstraintError};

/// One line of console input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Next,
    Prev,
    /// 0-based page index; typed 1-based by the user.
    Page(usize),
    Size(PageSize),
    /// Empty term clears the search.
    Search(String),
    Add,
    Edit(RecordId),
    Delete(RecordId),
    Import(PathBuf),
    Reload,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command `{0}`, type `help` for a list")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("invalid page number `{0}`")]
    InvalidPage(String),
    #[error(transparent)]
    InvalidValue(#[from] TypeConstraintError),
}

pub const HELP: &str = "\
Commands:
  next | n            next page
  prev | p            previous page
  page N              go to page N
  size N              show N records per page
  search [TERM]       filter by TERM, no term clears the filter
  add                 create a record
  edit ID             edit record ID
  delete ID           delete record ID (asks for confirmation)
  import FILE         import records from a CSV file
  reload | r          fetch the current page again
  help | ?            show this text
  quit | q            exit";

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let required = |name: &'static str| {
            if rest.is_empty() {
                Err(CommandError::MissingArgument(name))
            } else {
                Ok(rest)
            }
        };

        match word.to_ascii_lowercase().as_str() {
            "next" | "n" => Ok(Command::Next),
            "prev" | "p" => Ok(Command::Prev),
            "page" => {
                let raw = required("page")?;
                match raw.parse::<usize>() {
                    Ok(n) if n > 0 => Ok(Command::Page(n - 1)),
                    _ => Err(CommandError::InvalidPage(raw.to_string())),
                }
            }
            "size" => Ok(Command::Size(required("size")?.parse()?)),
            "search" | "s" => Ok(Command::Search(rest.to_string())),
            "add" | "a" => Ok(Command::Add),
            "edit" | "e" => Ok(Command::Edit(required("edit")?.parse()?)),
            "delete" | "d" => Ok(Command::Delete(required("delete")?.parse()?)),
            "import" => Ok(Command::Import(PathBuf::from(required("import")?))),
            "reload" | "r" | "" => Ok(Command::Reload),
            "help" | "?" => Ok(Command::Help),
            "quit" | "q" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// Whether a confirmation answer means yes. Anything else, including an
/// empty line, means no.
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_commands() {
        assert_eq!("next".parse::<Command>(), Ok(Command::Next));
        assert_eq!(" P ".parse::<Command>(), Ok(Command::Prev));
        assert_eq!("page 3".parse::<Command>(), Ok(Command::Page(2)));
        assert_eq!(
            "page 0".parse::<Command>(),
            Err(CommandError::InvalidPage("0".to_string()))
        );
        assert_eq!(
            "page".parse::<Command>(),
            Err(CommandError::MissingArgument("page"))
        );
    }

    #[test]
    fn search_keeps_inner_spaces_and_allows_clearing() {
        assert_eq!(
            "search  Alice Smith ".parse::<Command>(),
            Ok(Command::Search("Alice Smith".to_string()))
        );
        assert_eq!("search".parse::<Command>(), Ok(Command::Search(String::new())));
    }

    #[test]
    fn ids_and_sizes_are_validated() {
        assert_eq!(
            "delete 7".parse::<Command>(),
            Ok(Command::Delete(RecordId::new(7).unwrap()))
        );
        assert_eq!(
            "edit 0".parse::<Command>(),
            Err(CommandError::InvalidValue(TypeConstraintError::NonPositiveId))
        );
        assert_eq!(
            "size 0".parse::<Command>(),
            Err(CommandError::InvalidValue(TypeConstraintError::ZeroPageSize))
        );
    }

    #[test]
    fn empty_line_reloads_and_unknown_is_reported() {
        assert_eq!("".parse::<Command>(), Ok(Command::Reload));
        assert_eq!(
            "frobnicate".parse::<Command>(),
            Err(CommandError::Unknown("frobnicate".to_string()))
        );
    }

    #[test]
    fn confirmation_defaults_to_no() {
        assert!(is_yes("y"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("maybe"));
    }
}
