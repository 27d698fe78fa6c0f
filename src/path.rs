use std::ffi::OsStr;
use std::path::{PathBuf, Path, Component};
use std::fs::Metadata;
use std::io::ErrorKind;

pub fn metadata<P>(path: P) -> Result<Option<Metadata>, std::io::Error>
where
    P: AsRef<Path>
{
    match path.as_ref().metadata() {
        Ok(m) => Ok(Some(m)),
        Err(err) => match err.kind() {
            ErrorKind::NotFound => Ok(None),
            _ => Err(err)
        }
    }
}

pub fn normalize<P>(path: P) -> PathBuf
where
    P: AsRef<Path>
{
    let components = path.as_ref().components();
    let mut rtn = PathBuf::new();

    for comp in components {
        match comp {
            Component::Prefix(prefix) => {
                rtn.push(prefix.as_os_str());
            }
            Component::ParentDir => {
                rtn.pop();
            }
            Component::Normal(c) => {
                rtn.push(c);
            }
            Component::RootDir => {
                rtn.push(comp.as_os_str());
            }
            Component::CurDir => {}
        }
    }

    rtn
}

pub fn mime_from_ext(ext: Option<&OsStr>) -> mime::Mime {
    let Some(ext) = ext.and_then(OsStr::to_str) else {
        return mime::APPLICATION_OCTET_STREAM;
    };

    match ext.to_ascii_lowercase().as_str() {
        "json" => mime::APPLICATION_JSON,
        "yaml" | "yml" => "application/yaml".parse()
            .unwrap_or(mime::TEXT_PLAIN_UTF_8),
        "svg" => mime::IMAGE_SVG,
        "png" => mime::IMAGE_PNG,
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        "ico" => "image/x-icon".parse()
            .unwrap_or(mime::APPLICATION_OCTET_STREAM),
        "html" | "htm" => mime::TEXT_HTML_UTF_8,
        "txt" => mime::TEXT_PLAIN_UTF_8,
        "css" => mime::TEXT_CSS_UTF_8,
        "js" => mime::APPLICATION_JAVASCRIPT_UTF_8,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}
