//! Quotation JSON Schema: the structural contract sent to the model for
//! structured output. Must stay in lockstep with `quotation::model`.

use serde_json::{json, Value};

/// Name under which the schema is registered with the provider.
pub const SCHEMA_NAME: &str = "CotizacionTecnica";

/// Top-level keys every quotation must carry.
pub const REQUIRED_FIELDS: [&str; 11] = [
    "nombre_requerimiento",
    "numero_oferta",
    "fecha_cotizacion",
    "autores",
    "objetivo",
    "antecedentes",
    "alcance",
    "tiempo_inversion",
    "tiempo_desarrollo",
    "exclusiones",
    "condiciones_comerciales",
];

/// Builds the quotation JSON Schema. Every object level rejects undeclared properties.
pub fn quotation_schema() -> Value {
    let string = json!({"type": "string"});
    let string_list = json!({"type": "array", "items": {"type": "string"}});
    let integer = json!({"type": "integer"});

    json!({
        "type": "object",
        "properties": {
            "nombre_requerimiento": string,
            "numero_oferta": string,
            "fecha_cotizacion": string,
            "autores": string_list,
            "objetivo": string,
            "antecedentes": string,
            "alcance": string_list,
            "tiempo_inversion": {
                "type": "object",
                "properties": {
                    "detalle": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "actividad": string,
                                "horas": integer,
                                "tarifa": integer,
                                "subtotal": integer,
                            },
                            "required": ["actividad", "horas", "tarifa", "subtotal"],
                            "additionalProperties": false,
                        },
                    },
                    "total_horas": integer,
                    "total_cop": integer,
                },
                "required": ["detalle", "total_horas", "total_cop"],
                "additionalProperties": false,
            },
            "tiempo_desarrollo": string,
            "exclusiones": string_list,
            "condiciones_comerciales": {
                "type": "object",
                "properties": {
                    "pago": string,
                    "garantia": string,
                    "metodologia": string,
                },
                "required": ["pago", "garantia", "metodologia"],
                "additionalProperties": false,
            },
        },
        "required": REQUIRED_FIELDS,
        "additionalProperties": false,
    })
}

/// The `text.format` object for a strict JSON-schema constrained response.
pub fn response_format() -> Value {
    json!({
        "type": "json_schema",
        "name": SCHEMA_NAME,
        "schema": quotation_schema(),
        "strict": true,
    })
}
