//! 学习素材：展示方式判定与完成度跟踪
//!
//! 展示失败从不阻塞流程，无法内嵌的内容统一降级为“在新窗口打开”。

use ehs_learn_shared::protocol::material_stream_path;
use ehs_learn_shared::{ContentType, LearningModule};
use thiserror::Error;

use crate::config::ClientConfig;

/// 素材成功展示后上报的阶段性进度
pub const DISPLAY_PROGRESS_PERCENT: u8 = 50;
pub const COMPLETE_PERCENT: u8 = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MaterialError {
    #[error("material has no url")]
    MissingUrl,

    #[error("failed to load content from {url}: {reason}")]
    ContentLoad { url: String, reason: String },
}

// =========================================================
// 展示方式 (Viewer)
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    Pdf,
    Video,
    Image,
    HtmlContent,
    ExternalUrl,
    Other,
}

impl MaterialKind {
    /// 先看 URL 扩展名，扩展名无法判断时再看内容类型。
    /// `External` 类型总是外链。
    pub fn detect(content_type: ContentType, url: &str) -> Self {
        if content_type == ContentType::External {
            return MaterialKind::ExternalUrl;
        }

        let by_extension = extension(url).and_then(|ext| match ext.as_str() {
            "pdf" => Some(MaterialKind::Pdf),
            "mp4" | "webm" | "ogg" | "ogv" | "mov" | "m4v" => Some(MaterialKind::Video),
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "svg" => Some(MaterialKind::Image),
            "html" | "htm" => Some(MaterialKind::HtmlContent),
            // Office 文档浏览器无法内嵌
            "doc" | "docx" | "ppt" | "pptx" | "xls" | "xlsx" | "zip" => Some(MaterialKind::Other),
            _ => None,
        });

        by_extension.unwrap_or(match content_type {
            ContentType::Video => MaterialKind::Video,
            ContentType::Presentation | ContentType::Document => MaterialKind::Pdf,
            ContentType::External => MaterialKind::ExternalUrl,
            ContentType::Other => MaterialKind::Other,
        })
    }

    pub fn is_embeddable(&self) -> bool {
        match self {
            MaterialKind::Pdf
            | MaterialKind::Video
            | MaterialKind::Image
            | MaterialKind::HtmlContent => true,
            MaterialKind::ExternalUrl | MaterialKind::Other => false,
        }
    }
}

/// 小写扩展名，忽略查询串与锚点
fn extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let last = path.rsplit('/').next()?;
    let (_, ext) = last.rsplit_once('.')?;
    (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
}

fn is_absolute(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://") || url.starts_with("//")
}

/// 计算素材的实际访问地址
///
/// 绝对地址直接使用；带素材 ID 的相对地址走流式接口；其余按 API 根地址拼接。
pub fn resolve_source(module: &LearningModule, config: &ClientConfig) -> String {
    let url = module.url.trim();
    if is_absolute(url) {
        return url.to_string();
    }
    match module.id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) => config.url(&material_stream_path(id)),
        None if url.is_empty() => String::new(),
        None => config.url(url),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerPlan {
    Embed { kind: MaterialKind, url: String },
    OpenExternally { url: String, reason: String },
}

impl ViewerPlan {
    pub fn for_module(module: &LearningModule, config: &ClientConfig) -> Result<Self, MaterialError> {
        let url = resolve_source(module, config);
        if url.is_empty() {
            return Err(MaterialError::MissingUrl);
        }

        let kind = MaterialKind::detect(module.content_type, &url);
        if kind.is_embeddable() {
            Ok(ViewerPlan::Embed { kind, url })
        } else {
            Ok(ViewerPlan::OpenExternally {
                url,
                reason: format!("{:?} content cannot be embedded", kind),
            })
        }
    }

    /// 内嵌加载失败后降级为外链
    pub fn degrade(self, error: &MaterialError) -> Self {
        match self {
            ViewerPlan::Embed { url, kind } => {
                tracing::warn!(%url, ?kind, error = %error, "embedded viewer failed, opening externally");
                ViewerPlan::OpenExternally {
                    url,
                    reason: error.to_string(),
                }
            }
            other => other,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            ViewerPlan::Embed { url, .. } | ViewerPlan::OpenExternally { url, .. } => url,
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, ViewerPlan::Embed { .. })
    }

    /// 可翻页的幻灯片数。只有内嵌展示的演示文稿才能在页面上翻页。
    pub fn slide_count(&self, module: &LearningModule) -> Option<u32> {
        module
            .page_count
            .filter(|&n| n > 0 && module.content_type == ContentType::Presentation)
            .filter(|_| self.is_embedded())
    }
}

// =========================================================
// 完成度 (Completion)
// =========================================================

/// 素材查看器上报的事件
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModuleEvent {
    /// 视频播放位置（秒）
    VideoPosition { position: f64, duration: f64 },
    /// 演示文稿翻到第 `index` 页（从 0 开始）
    PageViewed { index: u32 },
    /// 查看器报告内容已加载
    DocumentLoaded,
    /// 用户手动标记完成
    MarkComplete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleProgress {
    content_type: ContentType,
    page_count: Option<u32>,
    percent: u8,
    complete: bool,
}

impl ModuleProgress {
    pub fn new(module: &LearningModule) -> Self {
        Self {
            content_type: module.content_type,
            page_count: module.page_count.filter(|&n| n > 0),
            percent: 0,
            complete: false,
        }
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// 处理一个事件；进度上升时返回新的百分比
    pub fn apply(&mut self, event: ModuleEvent) -> Option<u8> {
        let before = self.percent;

        match event {
            ModuleEvent::VideoPosition { position, duration } => {
                if duration > 0.0 && position.is_finite() {
                    let ratio = (position / duration).clamp(0.0, 1.0);
                    self.raise((ratio * 100.0).floor() as u8);
                    if self.content_type == ContentType::Video && position >= duration {
                        self.mark_complete();
                    }
                }
            }
            ModuleEvent::PageViewed { index } => {
                if let Some(pages) = self.page_count {
                    let viewed = index.saturating_add(1).min(pages);
                    self.raise((u64::from(viewed) * 100 / u64::from(pages)) as u8);
                    if self.content_type == ContentType::Presentation && viewed >= pages {
                        self.mark_complete();
                    }
                }
            }
            ModuleEvent::DocumentLoaded => {
                if self.content_type == ContentType::Document {
                    self.mark_complete();
                } else {
                    self.raise(DISPLAY_PROGRESS_PERCENT);
                }
            }
            ModuleEvent::MarkComplete => self.mark_complete(),
        }

        (self.percent > before).then_some(self.percent)
    }

    fn raise(&mut self, percent: u8) {
        self.percent = self.percent.max(percent.min(COMPLETE_PERCENT));
    }

    fn mark_complete(&mut self) {
        if !self.complete {
            tracing::debug!(content_type = ?self.content_type, "learning module complete");
        }
        self.complete = true;
        self.percent = COMPLETE_PERCENT;
    }
}
