//! Interactive `name=value` entry of the variables that are not plotted.
use crate::errors::{FixEntryIssue, MalformedFixEntry};
use log::{info, warn};
use regex::Regex;
use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::sync::LazyLock;

/// name -> value of the variables held constant, in name order
pub type FixedVariableSet = BTreeMap<String, f64>;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

/// Parses one `name=value` line. Whitespace around both sides is ignored.
pub fn parse_fix_entry(line: &str) -> Result<(String, f64), MalformedFixEntry> {
    let entry = line.trim();
    let reject = |issue| MalformedFixEntry { entry: entry.to_string(), issue };
    let parts: Vec<&str> = entry.split('=').collect();
    let (name, value) = match parts[..] {
        [name, value] => (name.trim(), value.trim()),
        [_] => return Err(reject(FixEntryIssue::MissingSeparator)),
        _ => return Err(reject(FixEntryIssue::TooManySeparators)),
    };
    if !IDENTIFIER.is_match(name) {
        return Err(reject(FixEntryIssue::InvalidName));
    }
    if name == "x" || name == "y" {
        return Err(reject(FixEntryIssue::ReservedAxis));
    }
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok((name.to_string(), v)),
        _ => Err(reject(FixEntryIssue::InvalidValue)),
    }
}

/// Reads entries until an empty line or the end of input. A rejected entry is reported
/// on `out` and the loop goes on; a name given twice keeps its last value.
pub fn collect_fixed_variables<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
) -> io::Result<FixedVariableSet> {
    let mut fixed = FixedVariableSet::new();
    loop {
        write!(out, "Fix a variable that is not plotted (e.g. z=1), or press Enter to continue: ")?;
        out.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 || line.trim().is_empty() {
            break;
        }
        match parse_fix_entry(&line) {
            Ok((name, value)) => {
                if let Some(previous) = fixed.insert(name.clone(), value) {
                    info!("{} changed from {} to {}", name, previous, value);
                } else {
                    info!("{} fixed at {}", name, value);
                }
            }
            Err(e) => {
                warn!("{}", e);
                writeln!(out, "Invalid format ({}). Use name=value, e.g. z=1.", e.issue)?;
            }
        }
    }
    Ok(fixed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_fix_entry() {
        assert_eq!(parse_fix_entry("z=1"), Ok(("z".to_string(), 1.0)));
        assert_eq!(parse_fix_entry("  alpha_2 =  -0.5e1 \n"), Ok(("alpha_2".to_string(), -5.0)));
    }

    #[test]
    fn test_rejected_entries() {
        let issue = |line: &str| parse_fix_entry(line).unwrap_err().issue;
        assert_eq!(issue("z 1"), FixEntryIssue::MissingSeparator);
        assert_eq!(issue("z=1=2"), FixEntryIssue::TooManySeparators);
        assert_eq!(issue("2z=1"), FixEntryIssue::InvalidName);
        assert_eq!(issue("=1"), FixEntryIssue::InvalidName);
        assert_eq!(issue("x=1"), FixEntryIssue::ReservedAxis);
        assert_eq!(issue("z=one"), FixEntryIssue::InvalidValue);
        assert_eq!(issue("z=inf"), FixEntryIssue::InvalidValue);
        assert_eq!(parse_fix_entry(" z 1 ").unwrap_err().entry, "z 1");
    }

    #[test]
    fn test_loop_recovers_and_last_write_wins() {
        let mut input = Cursor::new("z 1\nz=1\nw=3\nz=2\n\nnot read\n");
        let mut out = Vec::new();
        let fixed = collect_fixed_variables(&mut input, &mut out).unwrap();
        assert_eq!(fixed.len(), 2);
        assert_eq!(fixed["z"], 2.0);
        assert_eq!(fixed["w"], 3.0);
        let printed = String::from_utf8(out).unwrap();
        assert_eq!(printed.matches("Invalid format").count(), 1);
        // the line after the empty one is left for the caller
        let mut rest = String::new();
        input.read_line(&mut rest).unwrap();
        assert_eq!(rest, "not read\n");
    }

    #[test]
    fn test_end_of_input_ends_the_loop() {
        let mut input = Cursor::new("a=1");
        let fixed = collect_fixed_variables(&mut input, &mut Vec::new()).unwrap();
        assert_eq!(fixed["a"], 1.0);
    }
}
