use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "properties": {
            "scan": {
                "type": "object",
                "properties": {
                    "chunk_size": { "type": "integer", "minimum": 1 },
                    "retries": { "type": "integer", "minimum": 0 },
                    "retry_base_delay_ms": { "type": "integer", "minimum": 0 },
                    "max_chain_hops": { "type": "integer", "minimum": 1 },
                    "workers": { "type": "integer", "minimum": 1 },
                    "dns_timeout_secs": { "type": "integer", "minimum": 1 },
                    "http_timeout_secs": { "type": "integer", "minimum": 1 },
                    "resolvers": { "type": "array", "items": { "type": "string" }, "minItems": 1 },
                    "wildcard_probes": { "type": "integer", "minimum": 5 },
                    "wildcard_threshold_pct": { "type": "integer", "minimum": 1, "maximum": 100 },
                    "body_scan_kb": { "type": "integer", "minimum": 1 },
                    "max_body_kb": { "type": "integer", "minimum": 1 },
                    "user_agent": { "type": "string" }
                },
                "additionalProperties": false
            },
            "enumeration": {
                "type": "object",
                "properties": {
                    "binary": { "type": "string" },
                    "args": { "type": "array", "items": { "type": "string" } },
                    "timeout_secs": { "type": "integer", "minimum": 1 }
                },
                "additionalProperties": false
            },
            "blacklist": {
                "type": "object",
                "propertyNames": {
                    "enum": [
                        "ownership_verification",
                        "maintained_platform",
                        "internal_namespace",
                        "email_authentication"
                    ]
                },
                "additionalProperties": { "type": "array", "items": { "type": "string" } }
            },
            "verification_patterns": { "type": "array", "items": { "type": "string" } },
            "providers": { "type": "array", "items": { "$ref": "#/$defs/provider" } },
            "provider_files": { "type": "array", "items": { "type": "string" } }
        },
        "$defs": {
            "provider": {
                "type": "object",
                "required": ["name"],
                "properties": {
                    "name": { "type": "string", "minLength": 1 },
                    "cname_suffixes": { "type": "array", "items": { "type": "string" } },
                    "cidrs": { "type": "array", "items": { "type": "string" } },
                    "cidr_files": { "type": "array", "items": { "type": "string" } },
                    "unclaimed_signatures": { "type": "array", "items": { "type": "string" } },
                    "suspicious_statuses": {
                        "type": "array",
                        "items": { "type": "integer", "minimum": 100, "maximum": 599 }
                    }
                },
                "additionalProperties": false
            }
        }
    })
});
