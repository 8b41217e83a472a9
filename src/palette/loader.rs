//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源（URL / Base64 / 本地文件 / 内存字节）的原始字节加载，
//! 并在“尽可能早”的阶段执行输入校验，尽快失败。
//! 取色链路不做任何自动重试：失败直接返回，由调用方决定是否换图重试。
//!
//! ## 实现思路
//!
//! - URL：协议 + 主机安全 + 内容类型 + 体积校验 + 流式下载。
//! - Base64：格式解析 + 解码后体积限制。
//! - 文件：存在性 + metadata 体积限制 + 读取。
//! - 所有来源最终都要通过 magic bytes 图片签名校验。

use base64::{Engine as _, engine::general_purpose};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use tokio::net::lookup_host;

use super::source::RawImageData;
use super::{ImageDecodeError, PaletteConfig, PaletteExtractor};

const STREAM_SIGNATURE_PROBE_BYTES: usize = 4096;
const BUFFER_INITIAL_CAPACITY: usize = 16 * 1024;

impl PaletteExtractor {
    /// 从 URL 加载图片原始字节。
    pub(super) async fn load_from_url(
        &self,
        url: &str,
        config: &PaletteConfig,
    ) -> Result<RawImageData, ImageDecodeError> {
        log::info!("🌐 开始下载图片 - URL: {}", Self::redact_url_for_log(url));

        Self::validate_url_safety(url, config).await?;
        let bytes = Self::download_with_validation(url, config).await?;
        Self::validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "url",
        })
    }

    /// 从 Base64 字符串加载图片原始字节。
    pub(super) fn load_from_base64(
        &self,
        data: &str,
        config: &PaletteConfig,
    ) -> Result<RawImageData, ImageDecodeError> {
        log::info!("📝 开始处理 base64 图片");

        let bytes = Self::parse_base64_with_limit(data, config.max_file_size)?;
        Self::ensure_within_file_limit(bytes.len() as u64, config)?;
        Self::validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "base64",
        })
    }

    /// 从本地路径加载图片原始字节。
    pub(super) fn load_from_file(
        &self,
        path: &str,
        config: &PaletteConfig,
    ) -> Result<RawImageData, ImageDecodeError> {
        log::info!("📁 开始读取本地图片 - 路径: {}", path);

        let file_path = Path::new(path);
        if !file_path.exists() {
            return Err(ImageDecodeError::FileSystem(format!("文件不存在：{}", path)));
        }

        let metadata = std::fs::metadata(file_path)
            .map_err(|e| ImageDecodeError::FileSystem(format!("无法读取文件信息：{}", e)))?;
        Self::ensure_within_file_limit(metadata.len(), config)?;

        let bytes = std::fs::read(file_path)
            .map_err(|e| ImageDecodeError::FileSystem(format!("无法读取图片文件：{}", e)))?;
        Self::validate_image_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "file",
        })
    }

    /// 接收调用方已持有的图片字节。
    pub(super) fn load_from_bytes(
        &self,
        bytes: Vec<u8>,
        config: &PaletteConfig,
    ) -> Result<RawImageData, ImageDecodeError> {
        Self::check_in_memory_bytes(&bytes, config)?;

        Ok(RawImageData {
            bytes,
            source_hint: "bytes",
        })
    }

    /// 内存字节的入口校验：体积上限 + 图片签名。
    ///
    /// `extract_from_bytes` 与 `ImageSource::Bytes` 共用，两条路径限制一致。
    pub(super) fn check_in_memory_bytes(
        bytes: &[u8],
        config: &PaletteConfig,
    ) -> Result<(), ImageDecodeError> {
        Self::ensure_within_file_limit(bytes.len() as u64, config)?;
        Self::validate_image_signature(bytes)
    }

    fn ensure_within_file_limit(size: u64, config: &PaletteConfig) -> Result<(), ImageDecodeError> {
        if size > config.max_file_size {
            return Err(ImageDecodeError::ResourceLimit(format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                size as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }

    /// 执行带校验的网络下载（单次尝试，手动跟随重定向）。
    ///
    /// 使用流式读取，避免一次性读入导致内存峰值过高。
    pub(super) async fn download_with_validation(
        url: &str,
        config: &PaletteConfig,
    ) -> Result<Vec<u8>, ImageDecodeError> {
        let mut current_url = reqwest::Url::parse(url)
            .map_err(|e| ImageDecodeError::InvalidFormat(format!("URL 格式错误：{}", e)))?;

        for redirect_count in 0..=config.max_redirects {
            let client = Self::build_request_client_for_url(&current_url, config).await?;
            let response = client
                .get(current_url.clone())
                .header(
                    reqwest::header::ACCEPT,
                    "image/avif,image/webp,image/apng,image/*,*/*;q=0.8",
                )
                .send()
                .await
                .map_err(|e| Self::map_reqwest_error(e, current_url.as_str(), config))?;

            if response.status().is_redirection() {
                if redirect_count >= config.max_redirects {
                    return Err(ImageDecodeError::Network(format!(
                        "重定向次数超过限制（{}）",
                        config.max_redirects
                    )));
                }

                let location = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .ok_or_else(|| ImageDecodeError::Network("重定向响应缺少 Location 头".to_string()))?;

                let location_str = location
                    .to_str()
                    .map_err(|e| ImageDecodeError::InvalidFormat(format!("重定向地址无效：{}", e)))?;

                let next_url = current_url.join(location_str).map_err(|e| {
                    ImageDecodeError::InvalidFormat(format!("重定向 URL 解析失败：{}", e))
                })?;

                Self::validate_url_safety(next_url.as_str(), config).await?;

                log::debug!("↪️ 跳转到: {}", Self::redact_url_for_log(next_url.as_str()));
                current_url = next_url;
                continue;
            }

            if !response.status().is_success() {
                return Err(ImageDecodeError::Network(format!(
                    "HTTP {}: {}",
                    response.status().as_u16(),
                    Self::status_message(response.status().as_u16())
                )));
            }

            if let Some(ct) = response.headers().get(reqwest::header::CONTENT_TYPE) {
                if let Ok(ct_str) = ct.to_str() {
                    if !Self::is_image_content_type(ct_str) {
                        return Err(ImageDecodeError::InvalidFormat(format!(
                            "不是图片类型：{}",
                            ct_str
                        )));
                    }
                }
            }

            let total_len = response
                .headers()
                .get(reqwest::header::CONTENT_LENGTH)
                .and_then(|cl| cl.to_str().ok())
                .and_then(|cl| cl.parse::<u64>().ok());

            if let Some(size) = total_len {
                Self::ensure_within_file_limit(size, config)?;
            }

            return Self::read_body_with_limits(response, total_len, config).await;
        }

        Err(ImageDecodeError::Network("下载流程异常结束".to_string()))
    }

    async fn read_body_with_limits(
        mut response: reqwest::Response,
        total_len: Option<u64>,
        config: &PaletteConfig,
    ) -> Result<Vec<u8>, ImageDecodeError> {
        let initial_capacity = total_len
            .map(|len| len.min(config.max_file_size).min(usize::MAX as u64) as usize)
            .filter(|len| *len > 0)
            .unwrap_or(BUFFER_INITIAL_CAPACITY);
        let mut buffer = Vec::with_capacity(initial_capacity);
        let mut total: u64 = 0;
        let mut signature_validated = false;
        let mut received_first_chunk = false;

        loop {
            let read_timeout = if received_first_chunk {
                Duration::from_millis(config.stream_chunk_timeout_ms)
            } else {
                Duration::from_millis(config.stream_first_byte_timeout_ms)
            };

            let next_chunk_result = tokio::time::timeout(read_timeout, response.chunk())
                .await
                .map_err(|_| {
                    if received_first_chunk {
                        ImageDecodeError::Timeout("下载数据流读取超时".to_string())
                    } else {
                        ImageDecodeError::Timeout("下载首包超时".to_string())
                    }
                })?;

            let Some(chunk) = next_chunk_result
                .map_err(|e| ImageDecodeError::Network(format!("下载失败：{}", e)))?
            else {
                break;
            };

            received_first_chunk = true;

            total = total.saturating_add(chunk.len() as u64);
            if total > config.max_file_size {
                return Err(ImageDecodeError::ResourceLimit("下载后文件超过大小限制".to_string()));
            }
            buffer.extend_from_slice(&chunk);

            if !signature_validated {
                signature_validated =
                    Self::validate_stream_signature_probe(&buffer, STREAM_SIGNATURE_PROBE_BYTES)?;
            }
        }

        if !signature_validated {
            Self::validate_image_signature(&buffer)?;
        }

        log::debug!("✅ 下载完成 - {} bytes", total);
        Ok(buffer)
    }

    async fn build_request_client_for_url(
        url: &reqwest::Url,
        config: &PaletteConfig,
    ) -> Result<reqwest::Client, ImageDecodeError> {
        let builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download_timeout))
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .redirect(reqwest::redirect::Policy::none());

        if config.allow_private_network || !config.resolve_dns_for_url_safety {
            return builder
                .build()
                .map_err(|e| ImageDecodeError::Network(format!("无法创建 HTTP 客户端：{}", e)));
        }

        let Some(host) = url.host_str() else {
            return builder
                .build()
                .map_err(|e| ImageDecodeError::Network(format!("无法创建 HTTP 客户端：{}", e)));
        };

        if host.parse::<IpAddr>().is_ok() {
            return builder
                .build()
                .map_err(|e| ImageDecodeError::Network(format!("无法创建 HTTP 客户端：{}", e)));
        }

        let port = url
            .port_or_known_default()
            .ok_or_else(|| ImageDecodeError::InvalidFormat("URL 缺少端口信息".to_string()))?;

        // 固定到已校验的公网地址，避免校验与连接之间 DNS 结果被替换。
        let pinned = Self::resolve_public_socket_addrs(host, port).await?;
        let addr = pinned
            .first()
            .copied()
            .ok_or_else(|| ImageDecodeError::InvalidFormat("URL 未解析到有效公网地址".to_string()))?;

        builder
            .resolve(host, addr)
            .build()
            .map_err(|e| ImageDecodeError::Network(format!("无法创建 DNS 绑定客户端：{}", e)))
    }

    async fn resolve_public_socket_addrs(
        host: &str,
        port: u16,
    ) -> Result<Vec<SocketAddr>, ImageDecodeError> {
        let addrs = lookup_host((host, port))
            .await
            .map_err(|e| ImageDecodeError::Network(format!("URL 主机解析失败：{}", e)))?;

        let mut result = Vec::new();
        for addr in addrs {
            if Self::is_private_or_local_ip(addr.ip()) {
                return Err(ImageDecodeError::InvalidFormat(format!(
                    "URL 解析结果命中内网地址：{}",
                    addr.ip()
                )));
            }

            result.push(addr);
        }

        Ok(result)
    }

    fn is_image_content_type(content_type: &str) -> bool {
        content_type
            .split(';')
            .next()
            .map(|base| base.trim().to_ascii_lowercase().starts_with("image/"))
            .unwrap_or(false)
    }

    pub(super) fn redact_url_for_log(url: &str) -> String {
        let Ok(parsed) = reqwest::Url::parse(url) else {
            return "<invalid-url>".to_string();
        };

        let host = parsed.host_str().unwrap_or("<unknown-host>");
        let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();
        let path = parsed.path();

        format!("{}://{}{}{}", parsed.scheme(), host, port, path)
    }

    /// 校验 URL 安全性。
    ///
    /// 默认阻止本地/内网目标，防止 SSRF 风险。
    async fn validate_url_safety(url: &str, config: &PaletteConfig) -> Result<(), ImageDecodeError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| ImageDecodeError::InvalidFormat(format!("URL 格式错误：{}", e)))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ImageDecodeError::InvalidFormat("仅支持 HTTP/HTTPS".to_string()));
        }

        if config.allow_private_network {
            return Ok(());
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| ImageDecodeError::InvalidFormat("URL 缺少主机地址".to_string()))?;

        if Self::is_local_hostname(host) {
            return Err(ImageDecodeError::InvalidFormat(format!(
                "禁止访问本地网络地址：{}",
                host
            )));
        }

        // IPv6 字面量的 host_str 带方括号。
        let bare_host = host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = bare_host.parse::<IpAddr>() {
            if Self::is_private_or_local_ip(ip) {
                return Err(ImageDecodeError::InvalidFormat(format!("禁止访问内网 IP：{}", ip)));
            }

            return Ok(());
        }

        if config.resolve_dns_for_url_safety {
            let port = parsed
                .port_or_known_default()
                .ok_or_else(|| ImageDecodeError::InvalidFormat("URL 缺少端口信息".to_string()))?;

            if Self::resolve_public_socket_addrs(host, port).await?.is_empty() {
                return Err(ImageDecodeError::InvalidFormat("URL 未解析到有效地址".to_string()));
            }
        }

        Ok(())
    }

    fn is_local_hostname(host: &str) -> bool {
        host.eq_ignore_ascii_case("localhost")
            || host.eq_ignore_ascii_case("localhost.")
            || host.ends_with(".local")
    }

    /// 判断 IP 是否属于本地/内网/链路本地等受限范围。
    fn is_private_or_local_ip(ip: IpAddr) -> bool {
        match ip {
            IpAddr::V4(v4) => {
                if v4.is_private()
                    || v4.is_loopback()
                    || v4.is_link_local()
                    || v4.is_broadcast()
                    || v4.is_documentation()
                    || v4.is_unspecified()
                    || v4.is_multicast()
                {
                    return true;
                }

                let octets = v4.octets();
                octets[0] == 0 || (octets[0] == 100 && (octets[1] & 0b1100_0000) == 0b0100_0000)
            }
            IpAddr::V6(v6) => {
                v6.is_loopback()
                    || v6.is_unspecified()
                    || v6.is_unique_local()
                    || v6.is_unicast_link_local()
                    || v6.is_multicast()
            }
        }
    }

    fn estimate_base64_decoded_upper_bound_len(base64_data: &str) -> Result<u64, ImageDecodeError> {
        let len = base64_data.trim().len() as u64;
        let groups = len
            .checked_add(3)
            .ok_or_else(|| ImageDecodeError::ResourceLimit("Base64 输入长度溢出".to_string()))?
            / 4;

        groups
            .checked_mul(3)
            .ok_or_else(|| ImageDecodeError::ResourceLimit("Base64 解码体积估算溢出".to_string()))
    }

    /// 解析 Base64 输入（支持 Data URL / 纯 Base64），解码前先按长度估算体积。
    fn parse_base64_with_limit(data: &str, max_file_size: u64) -> Result<Vec<u8>, ImageDecodeError> {
        let normalized = data.trim();

        let payload = if normalized.starts_with("data:image/") {
            let base64_start = normalized
                .find(";base64,")
                .ok_or_else(|| ImageDecodeError::InvalidFormat("缺少 base64 标记".to_string()))?;
            &normalized[base64_start + 8..]
        } else {
            normalized
        };

        let estimated_len = Self::estimate_base64_decoded_upper_bound_len(payload)?;
        if estimated_len > max_file_size {
            return Err(ImageDecodeError::ResourceLimit(format!(
                "Base64 预计解码体积过大：{:.2} MB（限制：{:.2} MB）",
                estimated_len as f64 / 1024.0 / 1024.0,
                max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| ImageDecodeError::Decode(format!("Base64 解码失败：{}", e)))
    }

    fn map_reqwest_error(e: reqwest::Error, url: &str, config: &PaletteConfig) -> ImageDecodeError {
        let err_msg = e.to_string().replace(url, &Self::redact_url_for_log(url));

        if e.is_timeout() {
            ImageDecodeError::Timeout(format!("下载超时（{}秒）", config.download_timeout))
        } else if e.is_connect() {
            ImageDecodeError::Network(format!("无法连接：{}", err_msg))
        } else {
            ImageDecodeError::Network(format!("请求失败：{}", err_msg))
        }
    }

    fn status_message(code: u16) -> &'static str {
        match code {
            404 => "未找到",
            403 => "访问被拒绝",
            500..=599 => "服务器错误",
            _ => "请求失败",
        }
    }

    /// 通过文件签名（magic bytes）校验输入是否为图片。
    fn validate_image_signature(bytes: &[u8]) -> Result<(), ImageDecodeError> {
        if bytes.is_empty() {
            return Err(ImageDecodeError::InvalidFormat("图片内容为空".to_string()));
        }

        match Self::detect_image_signature(bytes)? {
            Some(mime) => {
                log::debug!("🔍 图片签名识别为 {}", mime);
                Ok(())
            }
            None => Err(ImageDecodeError::InvalidFormat("无法识别图片类型".to_string())),
        }
    }

    /// 识别图片签名。
    ///
    /// 先用 `infer`；`infer` 不认识的格式（PNM、QOI 等）再交给
    /// `image::guess_format`，解码器能读的格式都不会在这里被拦下。
    ///
    /// 返回值：
    /// - `Ok(Some(mime))`：已识别为图片
    /// - `Ok(None)`：两者都无法识别
    /// - `Err(...)`：已识别为非图片类型
    fn detect_image_signature(bytes: &[u8]) -> Result<Option<&'static str>, ImageDecodeError> {
        if let Some(kind) = infer::get(bytes) {
            if kind.matcher_type() != infer::MatcherType::Image {
                return Err(ImageDecodeError::InvalidFormat(format!(
                    "文件签名不是图片类型：{}",
                    kind.mime_type()
                )));
            }
            return Ok(Some(kind.mime_type()));
        }

        Ok(image::guess_format(bytes)
            .ok()
            .map(|format| format.to_mime_type()))
    }

    /// 流式下载阶段的签名探测。
    ///
    /// 返回值：
    /// - `Ok(true)`：已识别为图片
    /// - `Ok(false)`：当前字节不足以判断，继续下载
    /// - `Err(...)`：已识别为非图片，或达到探测上限仍无法识别
    fn validate_stream_signature_probe(
        bytes: &[u8],
        probe_limit: usize,
    ) -> Result<bool, ImageDecodeError> {
        if bytes.is_empty() {
            return Ok(false);
        }

        if Self::detect_image_signature(bytes)?.is_some() {
            return Ok(true);
        }

        if bytes.len() >= probe_limit {
            return Err(ImageDecodeError::InvalidFormat(format!(
                "下载前 {} 字节内无法识别图片类型",
                probe_limit
            )));
        }

        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    const PNG_SIGNATURE: [u8; 12] = [137, 80, 78, 71, 13, 10, 26, 10, 0, 0, 0, 13];

    #[tokio::test]
    async fn url_safety_blocks_private_targets_by_default() {
        let config = PaletteConfig::default();

        assert!(matches!(
            PaletteExtractor::validate_url_safety("http://127.0.0.1/image.png", &config).await,
            Err(ImageDecodeError::InvalidFormat(_))
        ));

        assert!(matches!(
            PaletteExtractor::validate_url_safety("https://localhost/image.png", &config).await,
            Err(ImageDecodeError::InvalidFormat(_))
        ));

        assert!(matches!(
            PaletteExtractor::validate_url_safety("ftp://example.com/image.png", &config).await,
            Err(ImageDecodeError::InvalidFormat(_))
        ));
    }

    #[tokio::test]
    async fn url_safety_allows_private_targets_when_enabled() {
        let mut config = PaletteConfig::default();
        config.allow_private_network = true;

        assert!(
            PaletteExtractor::validate_url_safety("http://127.0.0.1/image.png", &config)
                .await
                .is_ok()
        );
    }

    #[test]
    fn load_from_base64_rejects_non_image_payload() {
        let extractor = PaletteExtractor::new(PaletteConfig::default()).expect("extractor init failed");
        let config = PaletteConfig::default();

        let result = extractor.load_from_base64("SGVsbG8=", &config);

        assert!(matches!(result, Err(ImageDecodeError::InvalidFormat(_))));
    }

    #[test]
    fn load_from_base64_accepts_data_url_prefix() {
        let encoded = general_purpose::STANDARD.encode(PNG_SIGNATURE);
        let data_url = format!("data:image/png;base64,{}", encoded);

        let bytes = PaletteExtractor::parse_base64_with_limit(&data_url, 1024).expect("decode");
        assert_eq!(bytes, PNG_SIGNATURE);
    }

    #[test]
    fn parse_base64_with_limit_rejects_large_payload_before_decode() {
        let huge = "A".repeat(1024 * 1024);
        let result = PaletteExtractor::parse_base64_with_limit(&huge, 32);

        assert!(matches!(result, Err(ImageDecodeError::ResourceLimit(_))));
    }

    #[test]
    fn load_from_file_reports_missing_path() {
        let extractor = PaletteExtractor::new(PaletteConfig::default()).expect("extractor init failed");
        let config = PaletteConfig::default();

        let result = extractor.load_from_file("/definitely/not/here.png", &config);

        assert!(matches!(result, Err(ImageDecodeError::FileSystem(_))));
    }

    #[test]
    fn load_from_bytes_enforces_size_limit() {
        let extractor = PaletteExtractor::new(PaletteConfig::default()).expect("extractor init failed");
        let mut config = PaletteConfig::default();
        config.max_file_size = 4;

        let result = extractor.load_from_bytes(PNG_SIGNATURE.to_vec(), &config);

        assert!(matches!(result, Err(ImageDecodeError::ResourceLimit(_))));
    }

    #[test]
    fn content_type_parser_accepts_image_with_params() {
        assert!(PaletteExtractor::is_image_content_type("image/png; charset=utf-8"));
        assert!(PaletteExtractor::is_image_content_type("IMAGE/JPEG"));
        assert!(!PaletteExtractor::is_image_content_type("text/html; charset=utf-8"));
    }

    #[test]
    fn redact_url_for_log_removes_query_and_fragment() {
        let redacted = PaletteExtractor::redact_url_for_log(
            "https://example.com:8443/path/img.png?token=abc123#hash",
        );

        assert_eq!(redacted, "https://example.com:8443/path/img.png");
    }

    #[test]
    fn stream_signature_probe_recognizes_png_header() {
        let result = PaletteExtractor::validate_stream_signature_probe(&PNG_SIGNATURE, 64);

        assert!(matches!(result, Ok(true)));
    }

    #[test]
    fn signature_check_falls_back_to_image_format_guess() {
        assert!(PaletteExtractor::validate_image_signature(b"P6\n4 4\n255\n").is_ok());
        assert!(PaletteExtractor::validate_image_signature(b"qoif\0\0\0\x04\0\0\0\x04\x04\0").is_ok());
        assert!(matches!(
            PaletteExtractor::validate_stream_signature_probe(b"qoif\0\0\0\x04", 64),
            Ok(true)
        ));
        assert!(matches!(
            PaletteExtractor::validate_image_signature(b"just some bytes"),
            Err(ImageDecodeError::InvalidFormat(_))
        ));
    }

    #[test]
    fn check_in_memory_bytes_applies_file_limit() {
        let mut config = PaletteConfig::default();
        config.max_file_size = 4;

        assert!(matches!(
            PaletteExtractor::check_in_memory_bytes(b"P6\n4 4\n255\n", &config),
            Err(ImageDecodeError::ResourceLimit(_))
        ));
    }

    #[test]
    fn stream_signature_probe_rejects_non_image_payload() {
        let payload = b"<html><body>not an image</body></html>";
        let result = PaletteExtractor::validate_stream_signature_probe(payload, 64);

        assert!(matches!(result, Err(ImageDecodeError::InvalidFormat(_))));
    }

    #[tokio::test]
    async fn load_from_url_rejects_non_image_body_even_when_content_type_is_image() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server failed");
        let addr = listener.local_addr().expect("read local addr failed");

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept failed");

            let mut req_buf = [0u8; 1024];
            let _ = stream.read(&mut req_buf);

            let body = b"hello world";
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );

            stream.write_all(response.as_bytes()).expect("write headers failed");
            stream.write_all(body).expect("write body failed");
            stream.flush().expect("flush failed");
        });

        let extractor = PaletteExtractor::new(PaletteConfig::default()).expect("extractor init failed");
        let mut config = PaletteConfig::default();
        config.allow_private_network = true;

        let url = format!("http://127.0.0.1:{}/fake.png", addr.port());
        let result = extractor.load_from_url(&url, &config).await;

        server.join().expect("server thread failed");

        assert!(matches!(result, Err(ImageDecodeError::InvalidFormat(_))));
    }

    #[tokio::test]
    async fn download_reports_http_errors_without_retrying() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server failed");
        let addr = listener.local_addr().expect("read local addr failed");

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept failed");

            let mut req_buf = [0u8; 1024];
            let _ = stream.read(&mut req_buf);

            stream
                .write_all(b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .expect("write response failed");
            stream.flush().expect("flush failed");
        });

        let mut config = PaletteConfig::default();
        config.allow_private_network = true;

        let url = format!("http://127.0.0.1:{}/busy.png", addr.port());
        let result = PaletteExtractor::download_with_validation(&url, &config).await;

        server.join().expect("server thread failed");

        assert!(matches!(result, Err(ImageDecodeError::Network(_))));
    }

    #[tokio::test]
    async fn download_with_validation_blocks_redirect_to_localhost() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server failed");
        let addr = listener.local_addr().expect("read local addr failed");

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept failed");

            let mut req_buf = [0u8; 1024];
            let _ = stream.read(&mut req_buf);

            let response = format!(
                "HTTP/1.1 302 Found\r\nLocation: http://localhost:{}/final.png\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                addr.port()
            );

            stream
                .write_all(response.as_bytes())
                .expect("write redirect response failed");
            stream.flush().expect("flush failed");
        });

        let config = PaletteConfig::default();
        let url = format!("http://127.0.0.1:{}/start.png", addr.port());

        let result = PaletteExtractor::download_with_validation(&url, &config).await;

        server.join().expect("server thread failed");

        assert!(matches!(result, Err(ImageDecodeError::InvalidFormat(_))));
    }
}
