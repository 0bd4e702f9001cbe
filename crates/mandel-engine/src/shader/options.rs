/// Options controlling how program construction reports failures.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ShaderOptions {
    /// Return the first read/compile/link failure as `Err`.
    ///
    /// When `false` (the default), failures are logged, kept on the program
    /// as diagnostics, and construction still yields an unlinked program that
    /// draws nothing.
    pub strict: bool,
}

impl ShaderOptions {
    pub const fn permissive() -> Self {
        Self { strict: false }
    }

    pub const fn strict() -> Self {
        Self { strict: true }
    }
}
