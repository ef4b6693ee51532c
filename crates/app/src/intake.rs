use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use tradelens_core::analysis::entity::{
    AnalysisRequest, CHART_COUNT, CHART_TIMEFRAMES, ImageAttachment, InvestmentKind,
    RequestDraft, TextDocument,
};
use tradelens_core::analysis::error::RequestError;

/// # Summary
/// 将命令行给出的文件转换为请求时的错误。
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Unsupported image type for {0} (expected png, jpg, jpeg, gif, webp or heic)")]
    UnsupportedImage(PathBuf),

    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{0} is not a UTF-8 text file")]
    NotText(PathBuf),

    #[error("Expected {expected} chart images ({labels}), got {actual}")]
    ChartArgs {
        expected: usize,
        actual: usize,
        labels: String,
    },

    #[error(transparent)]
    Request(#[from] RequestError),
}

/// 一次 `analyze` 调用的原始输入。
#[derive(Debug, Clone)]
pub struct IntakeArgs {
    pub kind: InvestmentKind,
    pub capital: Decimal,
    pub holding: Option<String>,
    pub charts: Vec<PathBuf>,
    pub interface: PathBuf,
    pub document: Option<PathBuf>,
}

/// 将文件扩展名映射为模型接受的图片 MIME 类型。
pub fn guess_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, IntakeError> {
    fs::read(path).map_err(|source| IntakeError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// # Summary
/// 读取单个图片文件并生成附件。
///
/// # Logic
/// 1. 扩展名无法识别时直接拒绝，不读取文件。
/// 2. 读取字节，大小上限按原始字节检查。
pub fn read_image(path: &Path) -> Result<ImageAttachment, IntakeError> {
    let mime = guess_mime(path).ok_or_else(|| IntakeError::UnsupportedImage(path.to_path_buf()))?;
    let bytes = read_bytes(path)?;
    debug!("Read image {} ({} bytes, {})", path.display(), bytes.len(), mime);
    Ok(ImageAttachment::from_bytes(file_name(path), mime, &bytes)?)
}

pub fn read_document(path: &Path) -> Result<TextDocument, IntakeError> {
    let bytes = read_bytes(path)?;
    let text_content =
        String::from_utf8(bytes).map_err(|_| IntakeError::NotText(path.to_path_buf()))?;
    Ok(TextDocument {
        filename: file_name(path),
        text_content,
    })
}

/// # Summary
/// 用给定文件填充 `RequestDraft` 并提交。
///
/// # Logic
/// 1. 图表路径必须恰好 `CHART_COUNT` 个，并按周期顺序排列。
/// 2. 依次读取图表、下单界面截图以及可选文档。
/// 3. 请求校验交给 `RequestDraft::submit` 完成。

pub fn build_request(args: IntakeArgs) -> Result<AnalysisRequest, IntakeError> {
    if args.charts.len() != CHART_COUNT {
        return Err(IntakeError::ChartArgs {
            expected: CHART_COUNT,
            actual: args.charts.len(),
            labels: CHART_TIMEFRAMES
                .iter()
                .map(|tf| tf.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        });
    }

    let mut draft = RequestDraft::new();
    draft.kind = args.kind;
    draft.capital = args.capital;
    if let Some(holding) = args.holding {
        draft.holding_horizon = holding;
    }

    for (index, path) in args.charts.iter().enumerate() {
        draft.set_chart(index, Some(read_image(path)?))?;
    }
    draft.order_interface_image = Some(read_image(&args.interface)?);
    draft.supporting_document = args.document.as_deref().map(read_document).transpose()?;

    Ok(draft.submit()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;
    use tradelens_core::analysis::entity::MAX_IMAGE_BYTES;

    fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    fn args(dir: &TempDir) -> IntakeArgs {
        IntakeArgs {
            kind: InvestmentKind::Equity,
            capital: dec!(5000),
            holding: None,
            charts: ["5m.png", "15m.PNG", "1h.jpg", "4h.jpeg", "6h.webp"]
                .iter()
                .map(|n| write(dir, n, b"img"))
                .collect(),
            interface: write(dir, "ui.gif", b"ui"),
            document: None,
        }
    }

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime(Path::new("a.PNG")), Some("image/png"));
        assert_eq!(guess_mime(Path::new("a.jpeg")), Some("image/jpeg"));
        assert_eq!(guess_mime(Path::new("a.heic")), Some("image/heic"));
        assert_eq!(guess_mime(Path::new("a.bmp")), None);
        assert_eq!(guess_mime(Path::new("noext")), None);
    }

    #[test]
    fn test_build_request() {
        let dir = TempDir::new().unwrap();
        let mut input = args(&dir);
        input.document = Some(write(&dir, "notes.md", "Earnings on Thursday".as_bytes()));

        let request = build_request(input).unwrap();
        assert_eq!(request.kind(), InvestmentKind::Equity);
        assert_eq!(request.holding_horizon(), "1 hour");
        assert_eq!(request.chart_images()[1].mime_type, "image/png");
        assert_eq!(request.chart_images()[4].mime_type, "image/webp");
        assert_eq!(request.chart_images()[0].filename, "5m.png");
        assert_eq!(request.order_interface_image().mime_type, "image/gif");
        let doc = request.supporting_document().unwrap();
        assert_eq!(doc.filename, "notes.md");
        assert_eq!(doc.text_content, "Earnings on Thursday");
    }

    #[test]
    fn test_wrong_chart_count() {
        let dir = TempDir::new().unwrap();
        let mut input = args(&dir);
        input.charts.pop();
        assert!(matches!(
            build_request(input),
            Err(IntakeError::ChartArgs { expected: 5, actual: 4, .. })
        ));
    }

    #[test]
    fn test_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let mut input = args(&dir);
        input.interface = write(&dir, "ui.bmp", b"ui");
        assert!(matches!(build_request(input), Err(IntakeError::UnsupportedImage(_))));
    }

    #[test]
    fn test_oversized_image() {
        let dir = TempDir::new().unwrap();
        let mut input = args(&dir);
        input.charts[2] = write(&dir, "big.png", &vec![0u8; MAX_IMAGE_BYTES + 1]);
        assert!(matches!(
            build_request(input),
            Err(IntakeError::Request(RequestError::ImageTooLarge { .. }))
        ));
    }

    #[test]
    fn test_non_positive_capital() {
        let dir = TempDir::new().unwrap();
        let mut input = args(&dir);
        input.capital = dec!(0);
        assert!(matches!(
            build_request(input),
            Err(IntakeError::Request(RequestError::NonPositiveCapital(_)))
        ));
    }

    #[test]
    fn test_binary_document_rejected() {
        let dir = TempDir::new().unwrap();
        let mut input = args(&dir);
        input.document = Some(write(&dir, "doc.pdf", &[0xff, 0xfe, 0x00]));
        assert!(matches!(build_request(input), Err(IntakeError::NotText(_))));
    }
}
