//! Category slugs derived from Russian display names.
//!
//! Cyrillic letters are romanised with a fixed table (so "Напитки" becomes
//! `napitki`), then the `slug` crate normalises whatever is left. Words are
//! joined with underscores.

use slug::slugify;
use thiserror::Error;

const SEPARATOR: char = '_';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
}

/// Derive the category slug for a native-language category name.
pub fn category_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let transliterated = transliterate_cyrillic(input);
    let candidate = slugify(&transliterated).replace('-', &SEPARATOR.to_string());

    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

fn transliterate_cyrillic(input: &str) -> String {
    let mut output = String::with_capacity(input.len() * 2);

    for ch in input.chars() {
        match romanise(ch) {
            Some(latin) => output.push_str(latin),
            // Non-Cyrillic characters are left for slugify to filter or fold.
            None => output.push(ch),
        }
    }

    output
}

fn romanise(ch: char) -> Option<&'static str> {
    let lower = ch.to_lowercase().next().unwrap_or(ch);
    let latin = match lower {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' | 'ё' => "e",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "y",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "kh",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "shch",
        'ъ' | 'ь' => "",
        'ы' => "y",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    };
    Some(latin)
}
