use serde_json::Value;

/// Sanitizes sensitive fields in JSON payloads for logging
pub fn sanitize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sanitized = serde_json::Map::new();
            for (key, val) in map {
                let sanitized_val = if is_sensitive_field(key) {
                    mask_value(val)
                } else {
                    sanitize_json(val)
                };
                sanitized.insert(key.clone(), sanitized_val);
            }
            Value::Object(sanitized)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sanitize_json).collect()),
        Value::String(s) => Value::String(redact_digit_runs(s)),
        _ => value.clone(),
    }
}

/// Removes characters that could break out of quoted or markup contexts.
/// Applied to string values of audit metadata before they are stored.
pub fn strip_unsafe_chars(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, val)| (key.clone(), strip_unsafe_chars(val)))
                .collect(),
        ),
        Value::Array(arr) => Value::Array(arr.iter().map(strip_unsafe_chars).collect()),
        Value::String(s) => Value::String(
            s.chars()
                .filter(|ch| !matches!(ch, '<' | '>' | '"' | '\''))
                .collect(),
        ),
        _ => value.clone(),
    }
}

fn is_sensitive_field(key: &str) -> bool {
    matches!(
        key.to_lowercase().as_str(),
        "account_number"
            | "accountnumber"
            | "password"
            | "secret"
            | "token"
            | "api_key"
            | "authorization"
    )
}

fn mask_value(value: &Value) -> Value {
    match value {
        Value::String(s) if s.len() > 8 && s.is_ascii() => {
            let visible = &s[..4];
            let masked = "****";
            let end = &s[s.len() - 4..];
            Value::String(format!("{}{}{}", visible, masked, end))
        }
        _ => Value::String("****".to_string()),
    }
}

/// Masks free-standing runs of 9 or more digits (account or card numbers).
fn redact_digit_runs(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut run = String::new();

    let flush = |run: &mut String, out: &mut String| {
        if run.len() >= 9 {
            out.push_str(&"*".repeat(run.len()));
        } else {
            out.push_str(run);
        }
        run.clear();
    };

    for ch in s.chars() {
        if ch.is_ascii_digit() {
            run.push(ch);
        } else {
            flush(&mut run, &mut out);
            out.push(ch);
        }
    }
    flush(&mut run, &mut out);

    out
}
