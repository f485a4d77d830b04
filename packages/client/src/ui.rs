//! UI utilities for the client.

use std::io::Write;

/// Prompt shown by the line editor.
pub fn prompt(user_name: &str) -> String {
    format!("{}> ", user_name)
}

/// Print output from the network side and redisplay the prompt after it
pub fn print_above_prompt(text: &str, user_name: &str) {
    print!("{}", text);
    print!("{}", prompt(user_name));
    std::io::stdout().flush().ok();
}
