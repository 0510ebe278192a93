/////////////////////////////TESTS////////////////////////////////////////////////////
/*
tests:
Basic parsing test
Mixed type parsing test
Comment handling test
Empty document test
Malformed document test
File-based parsing test
*/

#[cfg(test)]
mod tests1 {
    use crate::Utils::task_parser::{
        Value, parse_document, parse_key, parse_key_value_pair, parse_section, parse_title,
        parse_value, parse_value_list,
    };

    #[test]
    fn test_parse_title() {
        let (remaining, title) = parse_title("plot\n x_range: 0, 10").unwrap();
        assert_eq!(title, "plot");
        assert_eq!(remaining, "x_range: 0, 10");

        let (remaining, title) = parse_title("section_2 key1: value1").unwrap();
        assert_eq!(title, "section_2");
        assert_eq!(remaining, "key1: value1");
    }

    #[test]
    fn test_parse_key() {
        let (remaining, key) = parse_key("line_style: -").unwrap();
        assert_eq!(key, "line_style");
        assert_eq!(remaining, ": -");
        assert!(parse_key("1abc: 3").is_err());
    }

    #[test]
    fn test_parse_value() {
        let (remaining, value) = parse_value("viridis, next").unwrap();
        assert_eq!(value, Value::String("viridis".to_string()));
        assert_eq!(remaining, ", next");

        let (_, value) = parse_value("-5, 5").unwrap();
        assert_eq!(value, Value::Integer(-5));

        let (_, value) = parse_value("0.25\n").unwrap();
        assert_eq!(value, Value::Float(0.25));

        let (_, value) = parse_value("false").unwrap();
        assert_eq!(value, Value::Boolean(false));

        // line styles are plain strings
        let (_, value) = parse_value("-.").unwrap();
        assert_eq!(value, Value::String("-.".to_string()));
    }

    #[test]
    fn test_parse_value_list() {
        let (remaining, values) = parse_value_list("0.1, 0.4 ,0.7\nnext").unwrap();
        assert_eq!(values, vec![Value::Float(0.1), Value::Float(0.4), Value::Float(0.7)]);
        assert_eq!(remaining, "\nnext");
    }

    #[test]
    fn test_parse_key_value_pair() {
        let (remaining, (key, values)) = parse_key_value_pair("x_range: 0, 10\n y_range: -5, 5").unwrap();
        assert_eq!(key, "x_range");
        assert_eq!(values, vec![Value::Integer(0), Value::Integer(10)]);
        assert_eq!(remaining, "y_range: -5, 5");

        let (_, (key, values)) = parse_key_value_pair("line_style : :").unwrap();
        assert_eq!(key, "line_style");
        assert_eq!(values, vec![Value::String(":".to_string())]);
    }

    #[test]
    fn test_parse_section_stops_at_next_title() {
        let (remaining, (title, map)) =
            parse_section("plot\n resolution: 100\n colormap: magma\nsession\n variant: combined").unwrap();
        assert_eq!(title, "plot");
        assert_eq!(map.len(), 2);
        assert_eq!(map["resolution"], vec![Value::Integer(100)]);
        assert_eq!(remaining, "session\n variant: combined");
    }

    #[test]
    fn test_parse_document_basic() {
        let input = "plot\n x_range: -1, 1\n levels: 5\nanalysis\n timeout_ms: 500\n seeds: 4\n";
        let (remaining, doc) = parse_document(input).unwrap();
        assert!(remaining.trim().is_empty());
        assert_eq!(doc.len(), 2);
        assert_eq!(doc["plot"]["x_range"][0].as_f64(), Some(-1.0));
        assert_eq!(doc["analysis"]["seeds"][0].as_integer(), Some(4));
    }

    #[test]
    fn test_repeated_section_merges() {
        let (_, doc) = parse_document("plot\n resolution: 10\nplot\n colormap: plasma").unwrap();
        assert_eq!(doc["plot"].len(), 2);
    }
}

#[cfg(test)]
mod tests2 {
    use crate::Utils::task_parser::{Value, filter_comments, parse_document_as};
    use crate::errors::ConfigError;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_filter_comments() {
        let input = "// header\nplot\n# a comment\n\n resolution: 50\n; trailing";
        assert_eq!(filter_comments(input), "plot\n resolution: 50");
    }

    #[test]
    fn test_parse_document_as_empty() {
        assert!(parse_document_as("").unwrap().is_empty());
        assert!(parse_document_as("# only comments\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_document_as_malformed() {
        match parse_document_as("plot\n resolution 50") {
            Err(ConfigError::Syntax(_)) => {}
            other => panic!("expected a syntax error, got {:?}", other),
        }
        assert!(parse_document_as("plot").is_err());
    }

    #[test]
    fn test_parse_document_from_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("plot_settings.txt");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "// contour settings").unwrap();
        writeln!(file, "plot").unwrap();
        writeln!(file, " x_range: 0, 10").unwrap();
        writeln!(file, " colormap: cividis").unwrap();
        writeln!(file, "session").unwrap();
        writeln!(file, " log_file: true").unwrap();
        drop(file);

        let content = std::fs::read_to_string(&file_path).unwrap();
        let doc = parse_document_as(&content).unwrap();
        assert_eq!(doc["plot"]["colormap"], vec![Value::String("cividis".to_string())]);
        assert_eq!(doc["session"]["log_file"][0].as_boolean(), Some(true));
    }
}
