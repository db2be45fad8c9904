use serde::{Deserialize, Serialize};

/// One tracked photo: where its bytes live in file storage, and a URI a
/// display surface can render directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRecord {
    #[serde(alias = "filepath")]
    file_path: String,

    #[serde(default, alias = "webviewPath", skip_serializing_if = "Option::is_none")]
    display_path: Option<String>,
}

impl PhotoRecord {
    /// Create a record.
    pub fn new(file_path: impl Into<String>, display_path: Option<String>) -> Self {
        Self {
            file_path: file_path.into(),
            display_path,
        }
    }

    /// Durable location of the photo in file storage: a bare file name on a
    /// web view, a full URI on a native host.
    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    /// URI a display surface can render without further decoding.
    pub fn display_path(&self) -> Option<&str> {
        self.display_path.as_deref()
    }

    /// The file name within the storage directory: everything after the
    /// last `/` of the file path.
    pub fn file_name(&self) -> &str {
        self.file_path
            .rsplit_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.file_path)
    }

    pub(crate) fn set_display_path(&mut self, display_path: Option<String>) {
        self.display_path = display_path;
    }
}

/// Decode a persisted photo list. A missing, blank or `null` value is an
/// empty list.
pub(crate) fn decode_list(stored: Option<&str>) -> Result<Vec<PhotoRecord>, serde_json::Error> {
    match stored.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(value) => Ok(serde_json::from_str::<Option<Vec<PhotoRecord>>>(value)?.unwrap_or_default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_is_last_segment() {
        let native = PhotoRecord::new("file:///data/user/0/app/files/1700000000000.jpeg", None);
        assert_eq!(native.file_name(), "1700000000000.jpeg");

        let web = PhotoRecord::new("1700000000000.jpeg", None);
        assert_eq!(web.file_name(), "1700000000000.jpeg");
    }

    #[test]
    fn serialized_form() {
        let records = vec![
            PhotoRecord::new("2.jpeg", Some("blob:http://localhost/2".into())),
            PhotoRecord::new("1.jpeg", None),
        ];
        assert_eq!(
            serde_json::to_string(&records).unwrap(),
            r#"[{"filePath":"2.jpeg","displayPath":"blob:http://localhost/2"},{"filePath":"1.jpeg"}]"#
        );
    }

    #[test]
    fn decodes_legacy_field_names() {
        let records =
            decode_list(Some(r#"[{"filepath":"1.jpeg","webviewPath":"https://localhost/1"}]"#))
                .unwrap();
        assert_eq!(
            records,
            vec![PhotoRecord::new("1.jpeg", Some("https://localhost/1".into()))]
        );
    }

    #[test]
    fn empty_values_decode_to_empty_list() {
        assert!(decode_list(None).unwrap().is_empty());
        assert!(decode_list(Some("")).unwrap().is_empty());
        assert!(decode_list(Some("  ")).unwrap().is_empty());
        assert!(decode_list(Some("null")).unwrap().is_empty());
        assert!(decode_list(Some("[]")).unwrap().is_empty());
        assert!(decode_list(Some("[{")).is_err());
    }
}
