//! PM command tokenization (spec.md §4.7): the first whitespace-delimited
//! word is the command, case-folded; the remainder is split into
//! arguments with rudimentary quoted-string handling so `bounty 50 "help
//! me beat this level"` keeps its description intact.

/// Splits `command arg1 "quoted arg" arg3` into `(command, args)`. The
/// command is lowercased; arguments are returned verbatim (quotes
/// stripped from quoted ones).
pub fn tokenize(input: &str) -> Option<(String, Vec<String>)> {
    let mut tokens = split_respecting_quotes(input.trim());
    if tokens.is_empty() {
        return None;
    }
    let command = tokens.remove(0).to_lowercase();
    Some((command, tokens))
}

fn split_respecting_quotes(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace_and_lowercases_command() {
        let (command, args) = tokenize("TIP @alice 50").unwrap();
        assert_eq!(command, "tip");
        assert_eq!(args, vec!["@alice", "50"]);
    }

    #[test]
    fn keeps_quoted_argument_intact() {
        let (command, args) = tokenize(r#"bounty 50 "beat the final boss""#).unwrap();
        assert_eq!(command, "bounty");
        assert_eq!(args, vec!["50", "beat the final boss"]);
    }

    #[test]
    fn empty_input_is_none() {
        assert!(tokenize("   ").is_none());
    }

    #[test]
    fn unterminated_quote_takes_rest_of_line() {
        let (_, args) = tokenize(r#"say "hello world"#).unwrap();
        assert_eq!(args, vec!["hello world"]);
    }
}
