//! `${ENV_VAR}` substitution in raw config text.
//!
//! Runs before parsing so secrets like the bot token never need to live in
//! the config file itself. Unresolvable or malformed placeholders are left
//! as-is.

/// Replace `${ENV_VAR}` placeholders with values from the process
/// environment.
#[must_use]
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

/// Replace `${ENV_VAR}` placeholders using a custom lookup function.
///
/// The separate signature keeps substitution testable without mutating the
/// process environment.
fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        match after_open.find('}') {
            Some(end) if end > 0 => {
                let name = &after_open[..end];
                match lookup(name) {
                    Some(value) => result.push_str(&value),
                    // Unresolved: keep the placeholder verbatim.
                    None => {
                        result.push_str("${");
                        result.push_str(name);
                        result.push('}');
                    },
                }
                rest = &after_open[end + 1..];
            },
            // `${}` or an unclosed `${`: emit literally and move on.
            _ => {
                result.push_str("${");
                rest = after_open;
            },
        }
    }

    result.push_str(rest);
    result
}
