//! Numbered-list selection and free-text prompts.

use dialoguer::Input;

use crate::{EntraSshError, Result};

/// Terminal interaction used by the connect flow
pub trait Prompt {
    /// Print a line for the user
    fn show(&mut self, line: &str);

    /// Read one line of input (may be empty)
    fn ask(&mut self, prompt: &str) -> Result<String>;
}

/// Prompt backed by stdout and dialoguer
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn show(&mut self, line: &str) {
        println!("{}", line);
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(EntraSshError::input)
    }
}

/// Parse a 1-based menu answer into an index
pub fn parse_choice(input: &str, len: usize) -> Option<usize> {
    match input.trim().parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => Some(n - 1),
        _ => None,
    }
}

/// Show `items` as a numbered list and ask until a valid number is entered.
/// Invalid answers are asked again without limit.
pub fn select<'a, T, F>(
    prompt: &mut dyn Prompt,
    title: &str,
    items: &'a [T],
    label: F,
) -> Result<&'a T>
where
    F: Fn(&T) -> String,
{
    if items.is_empty() {
        return Err(EntraSshError::EmptySelection(title.to_string()));
    }

    prompt.show("");
    prompt.show(title);
    for (i, item) in items.iter().enumerate() {
        prompt.show(&format!("  [{}] {}", i + 1, label(item)));
    }

    let question = format!("Enter a number (1-{})", items.len());
    loop {
        let answer = prompt.ask(&question)?;
        if let Some(index) = parse_choice(&answer, items.len()) {
            return Ok(&items[index]);
        }
    }
}

/// Ask for a value, repeating on blank input
pub fn ask_required(prompt: &mut dyn Prompt, question: &str) -> Result<String> {
    loop {
        let answer = prompt.ask(question)?;
        let answer = answer.trim();
        if !answer.is_empty() {
            return Ok(answer.to_string());
        }
    }
}
