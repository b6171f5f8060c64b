use once_cell::sync::Lazy;
use regex::Regex;

static LIMIT_POWER: Lazy<Regex> = Lazy::new(|| Regex::new(r"<10\^(\d+)").unwrap());
static SCIENTIFIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9.]+)×10\^(\d+)").unwrap());

/// Express a normalized CFU value on the log10 scale used by the report's log
/// section, one decimal place. Values that cannot be converted are returned as-is.
pub fn to_log10(cfu: &str) -> String {
    let cfu = cfu.trim();
    if cfu.is_empty() {
        return String::new();
    }
    if cfu.contains('<') {
        return match LIMIT_POWER.captures(cfu) {
            Some(c) => format!("<{}.0", &c[1]),
            None => "<1.0".to_string(),
        };
    }
    if let Some(c) = SCIENTIFIC.captures(cfu) {
        if let (Ok(base), Ok(exp)) = (c[1].parse::<f64>(), c[2].parse::<i32>()) {
            if base > 0.0 {
                return format!("{:.1}", f64::from(exp) + base.log10());
            }
        }
        return cfu.to_string();
    }
    match cfu.parse::<f64>() {
        Ok(n) if n > 0.0 => format!("{:.1}", n.log10()),
        _ => cfu.to_string(),
    }
}
