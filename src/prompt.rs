//! Thin wrappers around dialoguer, so every interactive touchpoint maps
//! prompt failures onto [`Error::UserAbort`].

use crate::error::Error;

pub fn input(label: &str) -> Result<String, Error> {
    dialoguer::Input::<String>::new()
        .with_prompt(label)
        .allow_empty(true)
        .interact_text()
        .map_err(Error::from)
}

pub fn input_with_default(label: &str, default: &str) -> Result<String, Error> {
    let mut prompt = dialoguer::Input::<String>::new()
        .with_prompt(label)
        .allow_empty(true);

    if !default.is_empty() {
        prompt = prompt.default(default.to_owned());
    }

    prompt.interact_text().map_err(Error::from)
}

pub fn secret(label: &str) -> Result<String, Error> {
    dialoguer::Password::new()
        .with_prompt(label)
        .interact()
        .map_err(Error::from)
}

pub fn confirm(label: &str, default: bool) -> Result<bool, Error> {
    dialoguer::Confirm::new()
        .with_prompt(label)
        .default(default)
        .interact()
        .map_err(Error::from)
}

/// Fuzzy list selection. Items carry their own `#{n} ` prefixes, so typing
/// `#3` narrows to the third entry while any other input fuzzy-matches
/// case-insensitively.
pub fn select(label: &str, items: &[String]) -> Result<usize, Error> {
    dialoguer::FuzzySelect::new()
        .with_prompt(label)
        .items(items)
        .default(0)
        .interact()
        .map_err(Error::from)
}
