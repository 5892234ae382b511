use std::{fmt, str::FromStr};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Syntax {
    Proto2,
    Proto3,
    Editions,
}

impl Syntax {
    /// Only proto2 keeps the `required` label meaningful.
    pub fn supports_required_prefix(self) -> bool {
        self == Syntax::Proto2
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Syntax::Proto2 => "proto2",
            Syntax::Proto3 => "proto3",
            Syntax::Editions => "editions",
        }
    }
}

impl Default for Syntax {
    fn default() -> Self {
        Syntax::Proto2
    }
}

impl FromStr for Syntax {
    type Err = crate::Error;
    fn from_str(input: &str) -> Result<Syntax, Self::Err> {
        match input {
            "proto3" => Ok(Syntax::Proto3),
            "proto2" | "" => Ok(Syntax::Proto2),
            "editions" => Ok(Syntax::Editions),
            other => Err(crate::Error::UnknownSyntax(other.to_string())),
        }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::Syntax;

    #[test]
    fn parses_known_syntaxes() {
        assert_eq!("proto3".parse::<Syntax>().unwrap(), Syntax::Proto3);
        assert_eq!("".parse::<Syntax>().unwrap(), Syntax::Proto2);
        assert!("proto4".parse::<Syntax>().is_err());
    }

    #[test]
    fn required_only_in_proto2() {
        assert!(Syntax::Proto2.supports_required_prefix());
        assert!(!Syntax::Proto3.supports_required_prefix());
    }
}
