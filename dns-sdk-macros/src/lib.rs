#[macro_export]
/// The `extract_params!` macro turns a request builder into a serializable
/// parameter struct for one AliDNS RPC action.
///
/// Every field named in the macro is read from the builder (which stores its
/// fields as `Option<_>`):
/// - `required` fields must be set, otherwise the enclosing function returns
///   early with a `String` error naming the field (`?` converts it)
/// - `optional` fields fall back to the given default
///
/// Each field is renamed to the RPC parameter name it is sent as.
///
/// # Usage
///
/// ```rust,ignore
/// let params = extract_params!(builder, AddDomainRecord, {
///     required domain_name: String => "DomainName",
///     required rr: String => "RR"
///     optional ttl: u32 = 600 => "TTL"
/// });
/// ```
///
/// Supported field types are `String`, `u32` and `u64`.
macro_rules! extract_params {
    (@type $ty:ident) => {
        $ty
    };

    (@extract_required $builder:expr, $field:ident, String) => {
        $builder
            .$field
            .clone()
            .ok_or_else(|| format!("missing required parameter {}", stringify!($field)))?
    };
    (@extract_required $builder:expr, $field:ident, u32) => {
        $builder
            .$field
            .ok_or_else(|| format!("missing required parameter {}", stringify!($field)))?
    };
    (@extract_required $builder:expr, $field:ident, u64) => {
        $builder
            .$field
            .ok_or_else(|| format!("missing required parameter {}", stringify!($field)))?
    };

    (@extract_optional $builder:expr, $field:ident, String, $default:expr) => {
        $builder.$field.clone().unwrap_or_else(|| $default.into())
    };
    (@extract_optional $builder:expr, $field:ident, u32, $default:expr) => {
        $builder.$field.unwrap_or($default)
    };
    (@extract_optional $builder:expr, $field:ident, u64, $default:expr) => {
        $builder.$field.unwrap_or($default)
    };

    (
        $builder:expr,
        $struct_name:ident,
        {
            $( required $req_field:ident : $req_ty:tt => $req_key:literal ),* $(,)*
            $( optional $opt_field:ident : $opt_ty:tt = $opt_default:expr => $opt_key:literal ),* $(,)*
        }
    ) => {{
        #[derive(Debug, serde::Serialize)]
        struct $struct_name {
            $(
                #[serde(rename = $req_key)]
                $req_field: extract_params!(@type $req_ty),
            )*
            $(
                #[serde(rename = $opt_key)]
                $opt_field: extract_params!(@type $opt_ty),
            )*
        }

        $struct_name {
            $(
                $req_field: extract_params!(@extract_required $builder, $req_field, $req_ty),
            )*
            $(
                $opt_field: extract_params!(@extract_optional $builder, $opt_field, $opt_ty, $opt_default),
            )*
        }
    }};
}
