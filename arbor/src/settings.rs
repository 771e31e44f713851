/// Runtime configuration for a [`Parser`][crate::Parser]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Treat `-h` and `--help` as help requests. While this is set, no field
    /// may use either spelling as a key.
    pub help: bool,

    /// Let arguments shaped like negative numbers (`-5`, `-.5`) be consumed
    /// as positionals when they aren't a declared key.
    pub negative_numbers: bool,
}

impl Settings {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            help: true,
            negative_numbers: true,
        }
    }

    #[must_use]
    pub const fn help(self, help: bool) -> Self {
        Self { help, ..self }
    }

    #[must_use]
    pub const fn negative_numbers(self, negative_numbers: bool) -> Self {
        Self {
            negative_numbers,
            ..self
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}
