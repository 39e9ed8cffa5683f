//! Line-oriented `KEY=VALUE` environment files.
//!
//! Every function here is a pure text transform: lines that are not the
//! targeted setting (comments, blank lines, unknown content) are carried
//! through byte for byte and in their original order.

/// Return the key of a `KEY=VALUE` setting line, or `None` for comments,
/// blank lines and anything without an `=`
fn setting_key(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    trimmed.split_once('=').map(|(key, _)| key)
}

/// Split a line from `split_inclusive('\n')` into its body and terminator
fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

/// Set `key` to `value`
///
/// The first line starting with `KEY=` is rewritten in place (keeping its line
/// ending) and any later duplicates are dropped. When no such line exists, one
/// `KEY=value` line is appended, after a newline if the content lacks one.
pub fn set_value(content: &str, key: &str, value: &str) -> String {
    let prefix = format!("{}=", key);
    let mut output = String::with_capacity(content.len() + prefix.len() + value.len() + 1);
    let mut found = false;

    for line in content.split_inclusive('\n') {
        if line.starts_with(&prefix) {
            if !found {
                let (_, terminator) = split_terminator(line);
                output.push_str(&prefix);
                output.push_str(value);
                output.push_str(terminator);
                found = true;
            }
        } else {
            output.push_str(line);
        }
    }

    if !found {
        if !output.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(&prefix);
        output.push_str(value);
        output.push('\n');
    }

    output
}

/// Value of the first `KEY=` line, if any
pub fn get_value(content: &str, key: &str) -> Option<String> {
    let prefix = format!("{}=", key);
    content
        .lines()
        .find_map(|line| line.strip_prefix(&prefix))
        .map(|value| value.trim_end_matches('\r').to_string())
}

/// Build an env file from a sample, forcing the version line to `version`
///
/// Any sample line mentioning `key` is replaced by `KEY=version`.
pub fn seed_from_sample(sample: &str, key: &str, version: &str) -> String {
    let mut output = String::with_capacity(sample.len());

    for line in sample.split_inclusive('\n') {
        if line.contains(key) {
            output.push_str(&format!("{}={}\n", key, version));
        } else {
            output.push_str(line);
        }
    }

    output
}

/// Default env file written by the `env` command
pub fn default_contents(key: &str, version: &str) -> String {
    format!(
        "REACT_APP_API_URL=http://localhost:5000/api\n\
         REACT_APP_SOCKET_URL=http://localhost:5000\n\
         {}={}\n",
        key, version
    )
}

/// Ordered settings of an env file; on duplicate keys the last value wins
pub fn parse_settings(content: &str) -> Vec<(String, String)> {
    let mut settings: Vec<(String, String)> = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = trimmed.split_once('=') {
            match settings.iter_mut().find(|(k, _)| k.as_str() == key) {
                Some(entry) => entry.1 = value.to_string(),
                None => settings.push((key.to_string(), value.to_string())),
            }
        }
    }

    settings
}

/// Write an edited settings list back over the original file content
///
/// Settings keep their original position; deleted keys disappear, new keys are
/// appended in the order given. Comments and unknown lines are untouched, and
/// setting lines whose value did not change are kept verbatim.
pub fn apply_settings(content: &str, settings: &[(String, String)]) -> String {
    let mut output = String::with_capacity(content.len());
    let mut written: Vec<&str> = Vec::new();

    for line in content.split_inclusive('\n') {
        let Some(key) = setting_key(line) else {
            output.push_str(line);
            continue;
        };

        if written.contains(&key) {
            continue;
        }

        if let Some((name, value)) = settings.iter().find(|(k, _)| k.as_str() == key) {
            let (body, terminator) = split_terminator(line);
            let unchanged = body
                .trim()
                .split_once('=')
                .map(|(_, old)| old == value)
                .unwrap_or(false);

            if unchanged {
                output.push_str(line);
            } else {
                output.push_str(&format!("{}={}", name, value));
                output.push_str(if terminator.is_empty() { "\n" } else { terminator });
            }
            written.push(name.as_str());
        }
    }

    for (key, value) in settings {
        if !written.contains(&key.as_str()) {
            if !output.is_empty() && !output.ends_with('\n') {
                output.push('\n');
            }
            output.push_str(&format!("{}={}\n", key, value));
        }
    }

    output
}
