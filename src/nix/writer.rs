//! Indenting writer for Nix attribute sets

/// Spaces per nesting level
const INDENT: &str = "  ";

/// Line-oriented Nix writer
///
/// Tracks the current nesting depth so callers only deal with attribute
/// names and values. Every line ends with `\n`.
#[derive(Debug, Default)]
pub struct NixWriter {
    out: String,
    depth: usize,
}

impl NixWriter {
    /// Create a writer starting at the given nesting depth
    pub fn new(depth: usize) -> Self {
        Self {
            out: String::new(),
            depth,
        }
    }

    /// Write one line at the current depth
    pub fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    /// Write an empty line
    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    /// Open `path = {` and indent
    pub fn open(&mut self, path: impl AsRef<str>) {
        self.line(format!("{} = {{", path.as_ref()));
        self.depth += 1;
    }

    /// Dedent and close with `};`
    pub fn close(&mut self) {
        self.close_with("};");
    }

    /// Open `path = [` and indent
    pub fn open_list(&mut self, path: impl AsRef<str>) {
        self.line(format!("{} = [", path.as_ref()));
        self.depth += 1;
    }

    /// Dedent and close with `];`
    pub fn close_list(&mut self) {
        self.close_with("];");
    }

    /// Open an anonymous attribute set inside a list
    pub fn open_element(&mut self) {
        self.line("{");
        self.depth += 1;
    }

    /// Close an anonymous attribute set inside a list
    pub fn close_element(&mut self) {
        self.close_with("}");
    }

    fn close_with(&mut self, closing: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(closing);
    }

    /// `path = "value";`
    pub fn string(&mut self, path: impl AsRef<str>, value: &str) {
        self.raw(path, &quote(value));
    }

    /// `path = value;` with the value written verbatim
    pub fn raw(&mut self, path: impl AsRef<str>, value: &str) {
        self.line(format!("{} = {};", path.as_ref(), value));
    }

    /// Multi-line string list, one quoted element per line
    pub fn string_list<S: AsRef<str>>(&mut self, path: impl AsRef<str>, items: &[S]) {
        self.open_list(path);
        for item in items {
            self.line(quote(item.as_ref()));
        }
        self.close_list();
    }

    /// Attribute set of quoted keys and quoted values
    pub fn string_attrs<'a>(
        &mut self,
        path: impl AsRef<str>,
        entries: impl IntoIterator<Item = (&'a str, &'a String)>,
    ) {
        self.open(path);
        for (key, value) in entries {
            self.string(quote(key), value);
        }
        self.close();
    }

    /// Indented `''` string block
    pub fn indented_string(&mut self, path: impl AsRef<str>, lines: &[String]) {
        self.line(format!("{} = ''", path.as_ref()));
        self.depth += 1;
        for text in lines {
            self.line(text.replace("''", "'''").replace("${", "''${"));
        }
        self.close_with("'';");
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// Double-quoted Nix string literal
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '$' if chars.peek() == Some(&'{') => quoted.push_str("\\$"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Nix keywords, which are not valid as bare attribute names
const KEYWORDS: &[&str] = &[
    "assert", "else", "if", "in", "inherit", "let", "or", "rec", "then", "with",
];

/// Attribute name, quoted unless it is a plain Nix identifier
pub fn attr_name(name: &str) -> String {
    let mut chars = name.chars();
    let plain = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '\''))
        }
        _ => false,
    };

    if plain && !KEYWORDS.contains(&name) {
        name.to_string()
    } else {
        quote(name)
    }
}
