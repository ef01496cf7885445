use qrcode::render::svg;
use qrcode::QrCode;

use crate::errors::ServiceError;

/// Render `payload` as a standalone SVG document.
pub fn render_qr_svg(payload: &str) -> Result<String, ServiceError> {
    let code = QrCode::new(payload.as_bytes()).map_err(|e| ServiceError::Internal(format!("qr encode: {e}")))?;
    Ok(code
        .render::<svg::Color>()
        .min_dimensions(200, 200)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build())
}
