//! IFS word splitting.

/// Split an expansion result on the IFS set. IFS whitespace runs
/// collapse; non-whitespace separators delimit fields individually.
pub fn split_on_ifs(value: &str, ifs: &str) -> Vec<String> {
    if ifs.is_empty() {
        return vec![value.to_string()];
    }

    let ifs_chars: Vec<char> = ifs.chars().collect();
    let whitespace: Vec<char> =
        ifs_chars.iter().copied().filter(|c| c.is_whitespace()).collect();
    let is_sep = |c: char| ifs_chars.contains(&c);
    let is_ws_sep = |c: char| whitespace.contains(&c);

    let mut fields = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = value.chars().collect();
    let mut i = 0;

    // Leading IFS whitespace is ignored
    while i < chars.len() && is_ws_sep(chars[i]) {
        i += 1;
    }

    while i < chars.len() {
        let c = chars[i];
        if is_sep(c) {
            fields.push(std::mem::take(&mut current));
            // A whitespace run plus at most one non-whitespace separator
            // counts as a single delimiter
            while i < chars.len() && is_ws_sep(chars[i]) {
                i += 1;
            }
            if i < chars.len() && is_sep(chars[i]) && !is_ws_sep(chars[i]) {
                i += 1;
                while i < chars.len() && is_ws_sep(chars[i]) {
                    i += 1;
                }
            }
            continue;
        }
        current.push(c);
        i += 1;
    }

    // A trailing delimiter does not open a final empty field
    if !current.is_empty() {
        fields.push(current);
    }

    fields
}
