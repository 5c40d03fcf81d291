//! `config.h`: preprocessor view of the snapshot.
use std::fmt::Write as _;

use crate::config::features::screaming_snake;
use crate::resolved::ResolvedConfig;

/// Render the generated C header.
///
/// Symbols of failing checks and disabled features appear as commented
/// `#undef` lines so the header documents every known symbol.
#[must_use]
pub fn render(config: &ResolvedConfig) -> String {
    let guard = format!("{}_CONFIG_H", screaming_snake(&config.app));
    let mut out = String::new();
    let _ = writeln!(
        out,
        "/* {} {} configuration, generated by buildconf; do not edit */",
        comment_text(&config.app),
        comment_text(&config.version)
    );
    let _ = writeln!(out, "#ifndef {guard}");
    let _ = writeln!(out, "#define {guard}");
    out.push('\n');

    string_define(&mut out, "APPNAME", &config.app);
    string_define(&mut out, "VERSION", &config.version);
    string_define(&mut out, "BUILD_PROFILE", &config.profile.to_string());
    string_define(&mut out, "BUILD_SUFFIX", config.profile.suffix());
    out.push('\n');

    for define in config.profile.defines() {
        let _ = writeln!(out, "#define {define} 1");
    }
    for (check, symbol) in &config.check_defines {
        let passed = config.probe_results.get(check).is_some_and(|r| r.outcome);
        flag_define(&mut out, symbol, passed);
    }
    for decision in config.features_in_order() {
        flag_define(&mut out, &decision.define, decision.is_enabled());
    }

    if !config.derived_paths.is_empty() {
        out.push('\n');
        for (name, path) in &config.derived_paths {
            string_define(&mut out, name, path);
        }
    }
    if !config.tool_invocations.is_empty() {
        out.push('\n');
        for (name, template) in &config.tool_invocations {
            string_define(&mut out, name, template);
        }
    }

    out.push('\n');
    let _ = writeln!(out, "#endif /* {guard} */");
    out
}

fn flag_define(out: &mut String, symbol: &str, on: bool) {
    if on {
        let _ = writeln!(out, "#define {symbol} 1");
    } else {
        let _ = writeln!(out, "/* #undef {symbol} */");
    }
}

fn string_define(out: &mut String, name: &str, value: &str) {
    let _ = writeln!(out, "#define {name} \"{}\"", c_escape(value));
}

fn comment_text(s: &str) -> String {
    c_escape(s).replace("*/", "*\\/")
}

/// Escape `s` for a C string literal. Control characters use three-digit
/// octal escapes so a following digit cannot extend them.
fn c_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_ascii_control() => {
                let _ = write!(out, "\\{:03o}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::engine::derived;
    use crate::platform::{Arch, Os, Platform};
    use crate::probe::test_helpers::gcc_toolchain;
    use crate::probe::toolchain::Toolchain;
    use crate::resolved::tests::sample_config;
    use std::collections::{BTreeMap, BTreeSet};
    use std::path::{Path, PathBuf};

    #[test]
    fn renders_guarded_header() {
        insta::assert_snapshot!(render(&sample_config()), @r#"
        /* demo 3-dev configuration, generated by buildconf; do not edit */
        #ifndef DEMO_CONFIG_H
        #define DEMO_CONFIG_H

        #define APPNAME "demo"
        #define VERSION "3-dev"
        #define BUILD_PROFILE "debug"
        #define BUILD_SUFFIX "-debug"

        #define _DEBUG 1
        #define HAVE_GSL 1
        /* #undef HAVE_PTHREAD_H */
        /* #undef ENABLE_THREADING */
        #define ENABLE_GSL 1

        #define BINDIR "/usr/local/bin"
        #define PREFIX "/usr/local"

        #define DEFINES_ST "-D%s"

        #endif /* DEMO_CONFIG_H */
        "#);
    }

    #[test]
    fn string_values_are_escaped() {
        assert_eq!(c_escape(r#"C:\tools\"x""#), r#"C:\\tools\\\"x\""#);
    }

    #[test]
    fn control_characters_are_escaped() {
        assert_eq!(c_escape("/opt/a\nb"), r"/opt/a\nb");
        assert_eq!(c_escape("v1\r\t"), r"v1\r\t");
        assert_eq!(c_escape("x\u{1b}1"), r"x\0331");
        assert_eq!(c_escape("\u{7f}"), r"\177");
        assert_eq!(c_escape("préfixe"), "préfixe");
    }

    #[test]
    fn escaped_values_stay_on_one_line() {
        let mut config = sample_config();
        config.version = "3\n#define EVIL 1".to_string();
        let header = render(&config);
        assert!(header.contains(r#"#define VERSION "3\n#define EVIL 1""#));
        assert!(header.starts_with(r"/* demo 3\n#define EVIL 1 configuration"));
        assert!(!header.lines().any(|l| l.starts_with("#define EVIL")));
        assert_eq!(comment_text("a */ b"), r"a *\/ b");
    }

    #[test]
    fn every_symbol_is_defined_once_with_compilers() {
        let toolchain = Toolchain {
            cxx: gcc_toolchain().cc,
            ..gcc_toolchain()
        };
        let mut locations = BTreeMap::new();
        locations.insert("version".to_string(), PathBuf::from("/usr/bin/version"));
        locations.insert("cc".to_string(), PathBuf::from("/usr/bin/gcc"));
        let mut config = sample_config();
        config.derived_paths = derived::derived_paths(
            Path::new("/usr/local"),
            &config.app,
            Path::new("/work/build"),
            &toolchain,
            &locations,
        );
        config.tool_invocations =
            derived::tool_invocations(Platform::new(Os::Linux, Arch::X86_64), &toolchain);

        let header = render(&config);
        let mut seen = BTreeSet::new();
        for name in header
            .lines()
            .filter_map(|l| l.strip_prefix("#define "))
            .filter_map(|rest| rest.split_whitespace().next())
        {
            assert!(seen.insert(name), "{name} defined twice");
        }
        assert!(header.contains(r#"#define CC "/usr/bin/gcc""#));
        assert!(header.contains(r#"#define CC_TEMPLATE "${CC} ${CFLAGS}"#));
        assert!(header.contains(r#"#define LINK_CXX_TEMPLATE "${LINK_CXX} "#));
        assert!(header.contains(r#"#define VERSION_PATH "/usr/bin/version""#));
        assert!(header.contains(r#"#define VERSION "3-dev""#));
    }
}
