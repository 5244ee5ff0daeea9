use std::io::Write;

pub fn read_input(label: &str) -> String {
    print!("{label}: ");
    std::io::stdout().flush().expect("Failed to flush stdout");
    let mut value = String::new();
    std::io::stdin()
        .read_line(&mut value)
        .expect("Failed to read input");
    value.trim().to_string()
}

pub fn read_input_hidden(label: &str) -> String {
    rpassword::prompt_password(format!("{label}: ")).expect("Failed to read input")
}

/// hh:mm:ss for display in the ticking list.
pub fn format_duration(total_seconds: i64) -> String {
    let total_seconds = total_seconds.max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(0), "00:00:00");
        assert_eq!(format_duration(61), "00:01:01");
        assert_eq!(format_duration(86_399), "23:59:59");
        assert_eq!(format_duration(-5), "00:00:00");
    }
}
