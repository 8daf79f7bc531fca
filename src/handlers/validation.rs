use garde::Validate;

use crate::error::AppError;

/// garde の検証結果を AppError に変換
pub fn validate_request<T>(request: &T) -> Result<(), AppError>
where
    T: Validate<Context = ()>,
{
    request.validate().map_err(|report| {
        tracing::debug!(report = %report, "リクエストのバリデーション失敗");
        AppError::Validation(report.to_string())
    })
}

/// 空白のみの文字列を拒否
pub fn not_blank(value: &str, _ctx: &()) -> garde::Result {
    if value.trim().is_empty() {
        return Err(garde::Error::new("空白のみの値は使用できません"));
    }
    Ok(())
}
