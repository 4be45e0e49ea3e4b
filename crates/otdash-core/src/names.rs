//! Employee-name cleanup
//!
//! Spreadsheet cells typed by hand carry stray whitespace, markers and
//! inconsistent casing. Both the employee filter options and employee
//! matching go through [`clean_name`] so that `"  JUAN  perez*"` and
//! `"Juan Perez"` are the same person.

const NOISE: [char; 5] = ['\n', '\t', '\r', '*', '#'];

/// Normalize an employee name; blank input yields `None`.
pub fn clean_name(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    let replaced: String = raw
        .trim()
        .chars()
        .map(|c| if NOISE.contains(&c) { ' ' } else { c })
        .collect();
    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let titled = title_case(&collapsed);
    if titled.is_empty() {
        None
    } else {
        Some(titled)
    }
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
