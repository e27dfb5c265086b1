//! Exchanging catalogs with a remote translation service.
//!
//! The service itself (authentication, projects, paging) lives behind
//! [`TranslationService`]; this module only moves catalog bytes through it.

use async_trait::async_trait;
use tracing::debug;

use crate::{
    catalog::Catalog,
    error::Error,
    language::Language,
    options::{OpenOptions, SaveOptions},
};

/// Identifies one file of a remote project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub project: String,
    /// File name including the extension, which selects the format.
    pub file_name: String,
    pub language: Language,
}

impl FileRef {
    pub fn new(project: impl Into<String>, file_name: impl Into<String>, language: Language) -> Self {
        FileRef {
            project: project.into(),
            file_name: file_name.into(),
            language,
        }
    }
}

/// A remote translation service.
#[async_trait]
pub trait TranslationService: Send + Sync {
    /// Returns the file's content in its native format.
    async fn download_file(&self, file: &FileRef) -> Result<Vec<u8>, Error>;

    async fn upload_file(&self, file: &FileRef, data: Vec<u8>) -> Result<(), Error>;
}

/// Downloads a file and parses it as a catalog.
pub async fn download_catalog(
    service: &dyn TranslationService,
    file: &FileRef,
) -> Result<Catalog, Error> {
    let data = service.download_file(file).await?;
    debug!(
        project = %file.project,
        file = %file.file_name,
        bytes = data.len(),
        "downloaded catalog"
    );
    let options = OpenOptions::new().with_language_hint(Some(file.language.clone()));
    Catalog::from_bytes_with(&data, &file.file_name, &options)
}

/// Serializes a catalog and uploads it. Nothing is uploaded if the catalog
/// can't be serialized.
pub async fn upload_catalog(
    service: &dyn TranslationService,
    file: &FileRef,
    catalog: &mut Catalog,
) -> Result<(), Error> {
    let data = catalog.save_to_buffer(&SaveOptions::default())?;
    debug!(
        project = %file.project,
        file = %file.file_name,
        bytes = data.len(),
        "uploading catalog"
    );
    service.upload_file(file, data).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashMap, sync::Mutex};

    #[derive(Default)]
    struct MemoryService {
        files: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl TranslationService for MemoryService {
        async fn download_file(&self, file: &FileRef) -> Result<Vec<u8>, Error> {
            let files = self.files.lock().map_err(|e| Error::Remote(e.to_string()))?;
            files
                .get(&file.file_name)
                .cloned()
                .ok_or_else(|| Error::Remote(format!("no such file: {}", file.file_name)))
        }

        async fn upload_file(&self, file: &FileRef, data: Vec<u8>) -> Result<(), Error> {
            let mut files = self.files.lock().map_err(|e| Error::Remote(e.to_string()))?;
            files.insert(file.file_name.clone(), data);
            Ok(())
        }
    }

    fn german(file_name: &str) -> FileRef {
        FileRef::new("app", file_name, Language::try_parse("de").unwrap())
    }

    #[tokio::test]
    async fn test_download_edit_upload() {
        let service = MemoryService::default();
        service.files.lock().unwrap().insert(
            "app.po".to_string(),
            b"msgid \"\"\nmsgstr \"\"\n\"Content-Type: text/plain; charset=UTF-8\\n\"\n\nmsgid \"Yes\"\nmsgstr \"\"\n".to_vec(),
        );

        let file = german("app.po");
        let mut catalog = download_catalog(&service, &file).await.unwrap();
        assert_eq!(catalog.language().unwrap().code(), "de");
        catalog.items_mut()[0].set_translation("Ja");
        upload_catalog(&service, &file, &mut catalog).await.unwrap();

        let uploaded = service.files.lock().unwrap()["app.po"].clone();
        assert!(String::from_utf8(uploaded).unwrap().ends_with("msgid \"Yes\"\nmsgstr \"Ja\"\n"));
    }

    #[tokio::test]
    async fn test_download_error_short_circuits() {
        let service = MemoryService::default();
        let err = download_catalog(&service, &german("missing.po")).await.unwrap_err();
        assert!(matches!(err, Error::Remote(_)));
    }

    #[tokio::test]
    async fn test_broken_markup_is_not_uploaded() {
        let service = MemoryService::default();
        let xliff = r#"<xliff version="1.2"><file source-language="en" target-language="de"><body><trans-unit id="a"><source>Hi <g id="1">there</g></source></trans-unit></body></file></xliff>"#;
        service
            .files
            .lock()
            .unwrap()
            .insert("a.xlf".to_string(), xliff.as_bytes().to_vec());

        let file = german("a.xlf");
        let mut catalog = download_catalog(&service, &file).await.unwrap();
        catalog.items_mut()[0].set_translation("Hallo <g>da");
        let err = upload_catalog(&service, &file, &mut catalog).await.unwrap_err();
        assert!(err.is_write_error());
        assert_eq!(service.files.lock().unwrap()["a.xlf"], xliff.as_bytes());
    }
}
