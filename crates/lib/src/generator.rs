//! Generator classification.
//!
//! The raw generator string is inspected exactly once, here. Everything
//! downstream dispatches on [`GeneratorFamily`].

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GeneratorFamily {
  UnixMakefiles,
  /// Xcode-like IDE projects that expose `package`/`install` as build targets.
  Xcode,
  VisualStudio,
  MinGW,
  Unknown,
}

impl GeneratorFamily {
  pub fn classify(generator: Option<&str>) -> Self {
    let Some(generator) = generator else {
      return GeneratorFamily::Unknown;
    };

    if generator.contains("Unix Makefiles") {
      GeneratorFamily::UnixMakefiles
    } else if generator.contains("Xcode") {
      GeneratorFamily::Xcode
    } else if generator.contains("Visual Studio") {
      GeneratorFamily::VisualStudio
    } else if generator.contains("MinGW Makefiles") {
      GeneratorFamily::MinGW
    } else {
      GeneratorFamily::Unknown
    }
  }

  /// Makefile families do not encode the configuration in the generated
  /// project, so configure needs an explicit `CMAKE_BUILD_TYPE`.
  pub fn is_single_config(&self) -> bool {
    matches!(self, GeneratorFamily::UnixMakefiles | GeneratorFamily::MinGW)
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      GeneratorFamily::UnixMakefiles => "unix-makefiles",
      GeneratorFamily::Xcode => "xcode",
      GeneratorFamily::VisualStudio => "visual-studio",
      GeneratorFamily::MinGW => "mingw",
      GeneratorFamily::Unknown => "unknown",
    }
  }
}

impl fmt::Display for GeneratorFamily {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

const GENERATOR_ABBREVIATIONS: &[(&str, &str)] = &[
  ("Visual Studio ", "VS"),
  ("Unix Makefiles", "umake"),
  ("MinGW Makefiles", "mmake"),
];

/// Short, space-free generator code for workspace names.
pub fn shorten_generator(generator: Option<&str>) -> String {
  let Some(generator) = generator else {
    return "default".to_string();
  };

  let mut result = generator.to_string();
  for (prefix, short) in GENERATOR_ABBREVIATIONS {
    if let Some(rest) = generator.strip_prefix(prefix) {
      result = format!("{}{}", short, rest);
      break;
    }
  }
  result.replace(' ', "")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn classify_known_families() {
    assert_eq!(
      GeneratorFamily::classify(Some("Unix Makefiles")),
      GeneratorFamily::UnixMakefiles
    );
    assert_eq!(GeneratorFamily::classify(Some("Xcode")), GeneratorFamily::Xcode);
    assert_eq!(
      GeneratorFamily::classify(Some("Visual Studio 15 2017 Win64")),
      GeneratorFamily::VisualStudio
    );
    assert_eq!(GeneratorFamily::classify(Some("MinGW Makefiles")), GeneratorFamily::MinGW);
  }

  #[test]
  fn classify_matches_substrings() {
    assert_eq!(
      GeneratorFamily::classify(Some("CodeBlocks - Unix Makefiles")),
      GeneratorFamily::UnixMakefiles
    );
  }

  #[test]
  fn classify_unknown() {
    assert_eq!(GeneratorFamily::classify(Some("Ninja")), GeneratorFamily::Unknown);
    assert_eq!(GeneratorFamily::classify(None), GeneratorFamily::Unknown);
  }

  #[test]
  fn shorten_known_prefixes() {
    assert_eq!(shorten_generator(Some("Visual Studio 16 2019")), "VS162019");
    assert_eq!(shorten_generator(Some("Unix Makefiles")), "umake");
    assert_eq!(shorten_generator(Some("MinGW Makefiles")), "mmake");
  }

  #[test]
  fn shorten_strips_spaces_from_others() {
    assert_eq!(shorten_generator(Some("Xcode")), "Xcode");
    assert_eq!(shorten_generator(Some("NMake Makefiles JOM")), "NMakeMakefilesJOM");
    assert_eq!(shorten_generator(None), "default");
  }
}
