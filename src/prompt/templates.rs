//! Fixed instruction text shared by both prompt templates.

/// Quality constraints placed after the build-system context.
pub const NOTICE: &str = "NOTICE:
====================
Please keep test(s) as simple, short, and clear as possible - use Arrange-Act-Assert template.
Do not rely on IDE auto-imports - import all required dependencies explicitly.
Tests should succeed to compile.
====================";

/// Output-format constraint.
pub const PLAIN_TEXT_ONLY: &str = "IMPORTANT: Output only plain text. Do not use markdown formatting. \
Do not use code blocks with triple backticks (```). Do not use any markdown syntax. \
Return only the raw code without any formatting or explanation.";

/// Prefix of the mandatory package line; the package name follows.
pub const PACKAGE_INSTRUCTION: &str = "ALWAYS start the file with the exact package declaration:";

/// Render the package instruction line for `package_name`.
///
/// An empty name yields the bare `package` keyword, i.e. the default package.
///
/// # Example
///
/// ```
/// use dessert::prompt::templates::package_line;
///
/// assert_eq!(
///     package_line("com.example"),
///     "ALWAYS start the file with the exact package declaration: package com.example"
/// );
/// assert!(package_line("").ends_with(": package"));
/// ```
pub fn package_line(package_name: &str) -> String {
    format!("{} package {}", PACKAGE_INSTRUCTION, package_name)
        .trim_end()
        .to_string()
}
