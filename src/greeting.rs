//! The single-capability `Greeting` interface.
//!
//! A named type and a plain closure are interchangeable implementations.

/// Something that can greet a person by name.
pub trait Greeting {
    fn greet(&self, name: &str) -> String;
}

/// Named implementation: `"Hello <name>"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishGreeting;

impl Greeting for EnglishGreeting {
    fn greet(&self, name: &str) -> String {
        format!("Hello {name}")
    }
}

impl<F> Greeting for F
where
    F: Fn(&str) -> String,
{
    fn greet(&self, name: &str) -> String {
        self(name)
    }
}

/// Languages with a built-in greeter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Language {
    #[default]
    English,
    Spanish,
    French,
}

/// Build the greeter for `language`.
pub fn greeting_for(language: Language) -> Box<dyn Greeting> {
    match language {
        Language::English => Box::new(EnglishGreeting),
        Language::Spanish => Box::new(|name: &str| format!("Hola {name}")),
        Language::French => Box::new(|name: &str| format!("Bonjour {name}")),
    }
}
