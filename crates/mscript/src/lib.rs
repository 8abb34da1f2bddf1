//! mscript: MethodSCRIPT wire protocol engine
//!
//! Decodes the instrument's compact data-package encoding into typed, unit-aware
//! values and curves, and drives the blocking command/response protocol over a
//! [`mscript_link::Link`], including abort/resynchronization recovery.

mod error;
pub use error::{DecodeError, ParseError, SessionError};

mod vartype;
pub use vartype::{lookup, VarType};

mod codec;
pub use codec::{
    decode_token, encode_token, status_to_text, Metadata, RawValue, ScriptVariable, SiPrefix,
    OFFSET, STATUS_FLAGS,
};

mod parser;
pub use parser::{
    classify_line, parse_data_package, parse_result, select_column, Curve, DataPackage, LineKind,
    ScriptResult, TerminatorKind,
};

mod devices;
pub use devices::{current_range_to_text, device_type_from_firmware, DeviceType, UNKNOWN_RANGE};

mod config;
pub use config::{load_session_config, SessionConfig};

mod metrics;
pub use metrics::{MetricsHub, ProtocolMetrics};

mod session;
pub use session::{LineRead, Measurement, Session, SessionState};

#[cfg(feature = "serial")]
pub use session::open_serial;
