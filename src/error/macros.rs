//! # 错误处理宏

/// 快速创建配置错误的宏
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::error::GatewayError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::GatewayError::config(format!($fmt, $($arg)*))
    };
}

/// 快速创建存储错误的宏
#[macro_export]
macro_rules! storage_error {
    ($msg:expr) => {
        $crate::error::GatewayError::storage($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::GatewayError::storage(format!($fmt, $($arg)*))
    };
}

/// 快速创建缓存错误的宏
#[macro_export]
macro_rules! cache_error {
    ($msg:expr) => {
        $crate::error::GatewayError::cache($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::GatewayError::cache(format!($fmt, $($arg)*))
    };
}

/// 快速创建上游数据源错误的宏
#[macro_export]
macro_rules! upstream_error {
    ($msg:expr) => {
        $crate::error::GatewayError::upstream($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::GatewayError::upstream(format!($fmt, $($arg)*))
    };
}

/// 快速创建参数验证错误的宏
#[macro_export]
macro_rules! validation_error {
    ($msg:expr) => {
        $crate::error::GatewayError::validation($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::GatewayError::validation(format!($fmt, $($arg)*))
    };
}

/// 快速创建业务错误的宏
#[macro_export]
macro_rules! business_error {
    ($msg:expr) => {
        $crate::error::GatewayError::business($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::GatewayError::business(format!($fmt, $($arg)*))
    };
}

/// 确保条件成立，否则返回参数验证错误
#[macro_export]
macro_rules! ensure_valid {
    ($cond:expr, $msg:expr) => {
        if !($cond) {
            return Err($crate::validation_error!($msg));
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !($cond) {
            return Err($crate::validation_error!($fmt, $($arg)*));
        }
    };
}
