fn group_thousands(int_part: &str) -> String {
    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    with_commas.chars().rev().collect()
}

/// Format a float as a real amount with thousands separators: R$ 1,234.56
pub fn money(val: f64) -> String {
    let negative = val < 0.0;
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));
    let with_commas = group_thousands(int_part);

    if negative && cents != "0.00" {
        format!("-R$ {with_commas}.{dec_part}")
    } else {
        format!("R$ {with_commas}.{dec_part}")
    }
}

/// Compact axis label: R$950, R$12.5k, R$3M.
pub fn format_k(val: f64) -> String {
    if val >= 1_000_000.0 {
        let m = val / 1_000_000.0;
        if m == m.floor() {
            format!("R${}M", m as u64)
        } else {
            format!("R${:.1}M", m)
        }
    } else if val >= 1000.0 {
        let k = val / 1000.0;
        if k == k.floor() {
            format!("R${}k", k as u64)
        } else {
            format!("R${:.1}k", k)
        }
    } else {
        format!("R${}", val.max(0.0) as u64)
    }
}

pub fn number(n: usize) -> String {
    group_thousands(&n.to_string())
}

pub fn percent(part: f64, whole: f64) -> String {
    if whole == 0.0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", part / whole * 100.0)
}
