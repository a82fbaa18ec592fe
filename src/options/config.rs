use serde::Deserialize;

/// The config file.
#[derive(Clone, Debug, Default, Deserialize)]
#[cfg_attr(test, serde(deny_unknown_fields), derive(PartialEq, Eq))]
pub struct Config {
    pub(crate) flags: Option<FlagConfig>,
}

/// The `[flags]` table. Each key mirrors a command-line flag of the same name.
#[derive(Clone, Debug, Default, Deserialize)]
#[cfg_attr(test, serde(deny_unknown_fields), derive(PartialEq, Eq))]
pub(crate) struct FlagConfig {
    pub(crate) interval: Option<StringOrNum>,
    pub(crate) usb_tree: Option<bool>,
    pub(crate) json: Option<bool>,
    pub(crate) sections: Option<Vec<String>>,
}

/// A value that is either a string or a number, like `"2s"` or `2000`.
#[derive(Clone, Debug, Deserialize)]
#[cfg_attr(test, derive(PartialEq, Eq))]
#[serde(untagged)]
pub(crate) enum StringOrNum {
    String(String),
    Num(u64),
}

impl From<String> for StringOrNum {
    fn from(value: String) -> Self {
        StringOrNum::String(value)
    }
}

impl From<u64> for StringOrNum {
    fn from(value: u64) -> Self {
        StringOrNum::Num(value)
    }
}

#[cfg(test)]
mod test {
    use indoc::indoc;

    use super::*;

    #[test]
    fn empty_config() {
        let config: Config = toml_edit::de::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn all_flags() {
        let config: Config = toml_edit::de::from_str(indoc! {r#"
            [flags]
            interval = "2s"
            usb_tree = false
            json = true
            sections = ["usb", "processor"]
        "#})
        .unwrap();

        assert_eq!(
            config.flags,
            Some(FlagConfig {
                interval: Some("2s".to_string().into()),
                usb_tree: Some(false),
                json: Some(true),
                sections: Some(vec!["usb".into(), "processor".into()]),
            })
        );
    }

    #[test]
    fn numeric_interval() {
        let config: Config = toml_edit::de::from_str("[flags]\ninterval = 500\n").unwrap();
        assert_eq!(
            config.flags.and_then(|flags| flags.interval),
            Some(StringOrNum::Num(500))
        );
    }

    #[test]
    fn mismatched_type() {
        let result = toml_edit::de::from_str::<Config>("[flags]\njson = \"yes\"\n");
        assert!(result.is_err());
    }
}
