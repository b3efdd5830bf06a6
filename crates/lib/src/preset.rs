//! Named build presets.
//!
//! A preset expands to a default CMake generator plus a bundle of extra flags.
//! Both the bingo and utilities orchestrators resolve presets through this
//! module; there is no shared mutable preset table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Preset {
  Win32_2013,
  Win64_2013,
  Win32_2015,
  Win64_2015,
  Win32_2017,
  Win64_2017,
  Win32_2019,
  Win64_2019,
  Win32Mingw,
  Win64Mingw,
  Linux32,
  Linux32Universal,
  Linux64,
  Linux64Universal,
  Mac10_10,
  Mac10_11,
  Mac10_12,
  Mac10_13,
  Mac10_14,
  MacUniversal,
}

/// Generator and flags a preset expands to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PresetDefaults {
  pub generator: &'static str,
  pub flags: &'static [&'static str],
}

impl Preset {
  pub const ALL: [Preset; 20] = [
    Preset::Win32_2013,
    Preset::Win64_2013,
    Preset::Win32_2015,
    Preset::Win64_2015,
    Preset::Win32_2017,
    Preset::Win64_2017,
    Preset::Win32_2019,
    Preset::Win64_2019,
    Preset::Win32Mingw,
    Preset::Win64Mingw,
    Preset::Linux32,
    Preset::Linux32Universal,
    Preset::Linux64,
    Preset::Linux64Universal,
    Preset::Mac10_10,
    Preset::Mac10_11,
    Preset::Mac10_12,
    Preset::Mac10_13,
    Preset::Mac10_14,
    Preset::MacUniversal,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Preset::Win32_2013 => "win32-2013",
      Preset::Win64_2013 => "win64-2013",
      Preset::Win32_2015 => "win32-2015",
      Preset::Win64_2015 => "win64-2015",
      Preset::Win32_2017 => "win32-2017",
      Preset::Win64_2017 => "win64-2017",
      Preset::Win32_2019 => "win32-2019",
      Preset::Win64_2019 => "win64-2019",
      Preset::Win32Mingw => "win32-mingw",
      Preset::Win64Mingw => "win64-mingw",
      Preset::Linux32 => "linux32",
      Preset::Linux32Universal => "linux32-universal",
      Preset::Linux64 => "linux64",
      Preset::Linux64Universal => "linux64-universal",
      Preset::Mac10_10 => "mac10.10",
      Preset::Mac10_11 => "mac10.11",
      Preset::Mac10_12 => "mac10.12",
      Preset::Mac10_13 => "mac10.13",
      Preset::Mac10_14 => "mac10.14",
      Preset::MacUniversal => "mac-universal",
    }
  }

  pub fn defaults(&self) -> PresetDefaults {
    let (generator, flags): (&'static str, &'static [&'static str]) = match self {
      Preset::Win32_2013 => ("Visual Studio 12 2013", &[]),
      Preset::Win64_2013 => ("Visual Studio 12 2013 Win64", &[]),
      Preset::Win32_2015 => ("Visual Studio 14 2015", &[]),
      Preset::Win64_2015 => ("Visual Studio 14 2015 Win64", &[]),
      Preset::Win32_2017 => ("Visual Studio 15 2017", &[]),
      Preset::Win64_2017 => ("Visual Studio 15 2017 Win64", &[]),
      Preset::Win32_2019 => ("Visual Studio 16 2019", &["-A", "Win32"]),
      Preset::Win64_2019 => ("Visual Studio 16 2019", &["-A", "x64"]),
      Preset::Win32Mingw => ("MinGW Makefiles", &["-DSUBSYSTEM_NAME=x86"]),
      Preset::Win64Mingw => ("MinGW Makefiles", &["-DSUBSYSTEM_NAME=x64"]),
      Preset::Linux32 | Preset::Linux32Universal => ("Unix Makefiles", &["-DSUBSYSTEM_NAME=x86"]),
      Preset::Linux64 | Preset::Linux64Universal => ("Unix Makefiles", &["-DSUBSYSTEM_NAME=x64"]),
      Preset::Mac10_10 => ("Xcode", &["-DSUBSYSTEM_NAME=10.10"]),
      Preset::Mac10_11 => ("Xcode", &["-DSUBSYSTEM_NAME=10.11"]),
      Preset::Mac10_12 => ("Xcode", &["-DSUBSYSTEM_NAME=10.12"]),
      Preset::Mac10_13 => ("Xcode", &["-DSUBSYSTEM_NAME=10.13"]),
      Preset::Mac10_14 => ("Xcode", &["-DSUBSYSTEM_NAME=10.14"]),
      Preset::MacUniversal => ("Unix Makefiles", &["-DSUBSYSTEM_NAME=10.7"]),
    };
    PresetDefaults { generator, flags }
  }

  pub fn is_universal(&self) -> bool {
    self.as_str().contains("universal")
  }

  pub fn is_linux(&self) -> bool {
    self.as_str().starts_with("linux")
  }

  /// Whether configure must pin the GNU toolchain (`CC=gcc CXX=g++`).
  pub fn selects_gnu_toolchain(&self) -> bool {
    self.is_linux() && self.is_universal()
  }

  /// Visual Studio release year encoded in the preset, if any.
  pub fn visual_studio_year(&self) -> Option<u16> {
    match self {
      Preset::Win32_2013 | Preset::Win64_2013 => Some(2013),
      Preset::Win32_2015 | Preset::Win64_2015 => Some(2015),
      Preset::Win32_2017 | Preset::Win64_2017 => Some(2017),
      Preset::Win32_2019 | Preset::Win64_2019 => Some(2019),
      _ => None,
    }
  }

  /// 64-bit Visual Studio generator and platform flags for the SQL Server
  /// wrappers. The preset's own architecture is ignored: msbuild links against
  /// the Win64 output.
  pub fn sqlserver_defaults(&self) -> Option<PresetDefaults> {
    let (generator, flags): (&'static str, &'static [&'static str]) = match self.visual_studio_year()? {
      2013 => ("Visual Studio 12 2013 Win64", &[]),
      2015 => ("Visual Studio 14 2015 Win64", &[]),
      2017 => ("Visual Studio 15 2017 Win64", &[]),
      _ => ("Visual Studio 16 2019", &["-A", "x64"]),
    };
    Some(PresetDefaults { generator, flags })
  }

  pub fn names() -> impl Iterator<Item = &'static str> {
    Preset::ALL.iter().map(Preset::as_str)
  }
}

impl fmt::Display for Preset {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Preset {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Preset::ALL.into_iter().find(|p| p.as_str() == s).ok_or_else(|| {
      format!(
        "unknown preset '{}' (expected one of: {})",
        s,
        Preset::names().collect::<Vec<_>>().join(", ")
      )
    })
  }
}

impl TryFrom<String> for Preset {
  type Error = String;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<Preset> for String {
  fn from(preset: Preset) -> Self {
    preset.as_str().to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  #[test]
  fn names_round_trip() {
    for preset in Preset::ALL {
      assert_eq!(preset.as_str().parse::<Preset>().unwrap(), preset);
    }
  }

  #[test]
  fn unknown_name_lists_choices() {
    let err = "win64-2022".parse::<Preset>().unwrap_err();
    assert!(err.contains("linux64-universal"));
  }

  #[test]
  fn universal_and_linux_classification() {
    assert!(Preset::Linux64Universal.is_universal());
    assert!(Preset::MacUniversal.is_universal());
    assert!(!Preset::Linux64.is_universal());

    assert!(Preset::Linux32.is_linux());
    assert!(!Preset::MacUniversal.is_linux());
  }

  #[test]
  fn gnu_toolchain_only_for_linux_universal() {
    let selecting: Vec<_> = Preset::ALL.into_iter().filter(Preset::selects_gnu_toolchain).collect();
    assert_eq!(selecting, vec![Preset::Linux32Universal, Preset::Linux64Universal]);
  }

  #[test]
  fn sqlserver_defaults_require_visual_studio() {
    let vs2015 = Preset::Win32_2015.sqlserver_defaults().unwrap();
    assert_eq!(vs2015.generator, "Visual Studio 14 2015 Win64");
    assert!(vs2015.flags.is_empty());
    assert_eq!(Preset::Linux64.sqlserver_defaults(), None);
    assert_eq!(Preset::Win32Mingw.sqlserver_defaults(), None);
  }

  #[test]
  fn sqlserver_2019_is_always_x64() {
    for preset in [Preset::Win32_2019, Preset::Win64_2019] {
      let defaults = preset.sqlserver_defaults().unwrap();
      assert_eq!(defaults.generator, "Visual Studio 16 2019");
      assert_eq!(defaults.flags, &["-A", "x64"]);
    }
  }

  #[test]
  fn expansions_are_distinct() {
    let expansions: HashSet<_> = Preset::ALL
      .iter()
      .map(|p| (p.defaults(), p.is_universal()))
      .collect();
    assert_eq!(expansions.len(), Preset::ALL.len());
  }

  #[test]
  fn serde_uses_preset_names() {
    let json = serde_json::to_string(&Preset::Mac10_12).unwrap();
    assert_eq!(json, "\"mac10.12\"");
    let parsed: Preset = serde_json::from_str("\"win64-mingw\"").unwrap();
    assert_eq!(parsed, Preset::Win64Mingw);
  }
}
