//! Request fixtures shared by the benchmarks.

/// A request head stored under `resources/request`.
#[derive(Debug, Copy, Clone)]
pub struct RequestFixture {
    name: &'static str,
    size: FixtureSize,
    content: &'static str,
}

impl RequestFixture {
    pub const fn new(name: &'static str, size: FixtureSize, content: &'static str) -> Self {
        Self { name, size, content }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn size(&self) -> FixtureSize {
        self.size
    }

    pub fn bytes(&self) -> &'static [u8] {
        self.content.as_bytes()
    }

    /// The request repeated `count` times back to back, the way a pipelining
    /// client writes it.
    pub fn pipelined(&self, count: usize) -> Vec<u8> {
        self.bytes().repeat(count)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FixtureSize {
    Small,
    Large,
}

impl FixtureSize {
    pub fn label(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Large => "large",
        }
    }
}
