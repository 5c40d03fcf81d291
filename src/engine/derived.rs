//! Derived installation paths and command templates.
//!
//! Derived paths are host-specific (absolute prefix, compiler and tool
//! locations) and therefore kept apart from everything fingerprinted.
//! Tool invocation templates depend only on the target platform and the
//! compiler family.
//!
//! Both maps are rendered into one flat namespace, so their keys never
//! overlap: compiler paths are `CC`, `CXX`, `LINK_CC` and `LINK_CXX`, the
//! commands using them are `<NAME>_TEMPLATE`, and check locations are
//! `<CHECK>_PATH`.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::features::screaming_snake;
use crate::platform::{Os, Platform};
use crate::probe::toolchain::Toolchain;

/// Installation directories under `prefix`, GNU layout.
#[must_use]
pub fn install_dirs(prefix: &Path, app: &str) -> BTreeMap<String, String> {
    let under = |rel: &str| prefix.join(rel).display().to_string();
    let docdir = prefix.join("share").join("doc").join(app);
    [
        ("PREFIX", prefix.display().to_string()),
        ("EXEC_PREFIX", prefix.display().to_string()),
        ("BINDIR", under("bin")),
        ("SBINDIR", under("sbin")),
        ("LIBEXECDIR", under("libexec")),
        ("SYSCONFDIR", under("etc")),
        ("LOCALSTATEDIR", under("var")),
        ("LIBDIR", under("lib")),
        ("INCLUDEDIR", under("include")),
        ("DATAROOTDIR", under("share")),
        ("DATADIR", under("share")),
        ("MANDIR", under("share/man")),
        ("LOCALEDIR", under("share/locale")),
        ("DOCDIR", docdir.display().to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Every host-specific path: install directories, build directory,
/// compilers and the locations of found headers, libraries and programs
/// (keyed by the check id in upper snake case with a `_PATH` suffix).
#[must_use]
pub fn derived_paths(
    prefix: &Path,
    app: &str,
    build_dir: &Path,
    toolchain: &Toolchain,
    locations: &BTreeMap<String, PathBuf>,
) -> BTreeMap<String, String> {
    let mut paths = install_dirs(prefix, app);
    paths.insert("BUILD_DIR".to_string(), build_dir.display().to_string());
    if let Some(cc) = &toolchain.cc {
        paths.insert("CC".to_string(), cc.program());
        paths.insert("LINK_CC".to_string(), cc.program());
    }
    if let Some(cxx) = &toolchain.cxx {
        paths.insert("CXX".to_string(), cxx.program());
        paths.insert("LINK_CXX".to_string(), cxx.program());
    }
    for (check, location) in locations {
        paths.insert(location_key(check), location.display().to_string());
    }
    paths
}

/// Key of the found location of `check` in [`derived_paths`].
#[must_use]
pub fn location_key(check: &str) -> String {
    format!("{}_PATH", screaming_snake(check))
}

/// Command templates and flag patterns for the build orchestrator.
///
/// `${NAME}` placeholders are filled by the orchestrator; `%s` patterns take
/// a single value.
#[must_use]
pub fn tool_invocations(platform: Platform, toolchain: &Toolchain) -> BTreeMap<String, String> {
    let msvc = toolchain.is_msvc();
    let mut t: Vec<(&str, &str)> = if msvc {
        vec![
            ("CC_TEMPLATE", "${CC} /nologo ${CFLAGS} ${DEFINES} ${INCPATHS} /c ${SRC} /Fo${TGT}"),
            ("CXX_TEMPLATE", "${CXX} /nologo ${CXXFLAGS} ${DEFINES} ${INCPATHS} /c ${SRC} /Fo${TGT}"),
            ("LINK_CC_TEMPLATE", "${LINK_CC} /nologo ${SRC} /Fe${TGT} ${LIBS} /link ${LIBPATHS} ${LDFLAGS}"),
            ("LINK_CXX_TEMPLATE", "${LINK_CXX} /nologo ${SRC} /Fe${TGT} ${LIBS} /link ${LIBPATHS} ${LDFLAGS}"),
            ("DEFINES_ST", "/D%s"),
            ("CPPPATH_ST", "/I%s"),
            ("LIB_ST", "%s.lib"),
            ("STLIB_ST", "%s.lib"),
            ("LIBPATH_ST", "/LIBPATH:%s"),
        ]
    } else {
        vec![
            ("CC_TEMPLATE", "${CC} ${CFLAGS} ${DEFINES} ${INCPATHS} -c ${SRC} -o ${TGT}"),
            ("CXX_TEMPLATE", "${CXX} ${CXXFLAGS} ${DEFINES} ${INCPATHS} -c ${SRC} -o ${TGT}"),
            ("LINK_CC_TEMPLATE", "${LINK_CC} ${SRC} -o ${TGT} ${LIBPATHS} ${LIBS} ${LDFLAGS}"),
            ("LINK_CXX_TEMPLATE", "${LINK_CXX} ${SRC} -o ${TGT} ${LIBPATHS} ${LIBS} ${LDFLAGS}"),
            ("DEFINES_ST", "-D%s"),
            ("CPPPATH_ST", "-I%s"),
            ("LIB_ST", "-l%s"),
            ("STLIB_ST", "-l%s"),
            ("LIBPATH_ST", "-L%s"),
            ("RPATH_ST", "-Wl,-rpath,%s"),
        ]
    };
    match platform.os {
        Os::Linux | Os::Freebsd if !msvc => t.push(("SONAME_ST", "-Wl,-h,%s")),
        Os::Macos => t.push(("SONAME_ST", "-Wl,-install_name,%s")),
        _ => {}
    }
    let (program, shlib, stlib) = match platform.os {
        Os::Windows if msvc => ("%s.exe", "%s.dll", "%s.lib"),
        Os::Windows => ("%s.exe", "lib%s.dll", "lib%s.a"),
        Os::Macos => ("%s", "lib%s.dylib", "lib%s.a"),
        Os::Linux | Os::Freebsd => ("%s", "lib%s.so", "lib%s.a"),
    };
    t.extend([
        ("cprogram_PATTERN", program),
        ("cshlib_PATTERN", shlib),
        ("cstlib_PATTERN", stlib),
        ("cxxprogram_PATTERN", program),
        ("cxxshlib_PATTERN", shlib),
        ("cxxstlib_PATTERN", stlib),
    ]);
    t.into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
