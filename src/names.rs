/// Hands out unique identifiers for hooks and hoisted runtime names.
///
/// One generator lives per compilation, so two compilations of the same
/// input produce identical names.
#[derive(Debug, Default)]
pub struct NameGenerator {
    counter: u64,
}

impl NameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{}_{}", prefix, self.counter)
    }

    pub fn hook(&mut self) -> String {
        self.next("hook")
    }
}
