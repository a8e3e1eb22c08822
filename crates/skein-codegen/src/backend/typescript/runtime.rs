//! Support code emitted once, into the root or single module

use crate::imports::{Import, ImportSet};
use crate::synth::StringFormat;

const CODEC: &str = r#"/** Any JSON value */
export type Json = null | boolean | number | string | Json[] | { [key: string]: Json };

/** Open string-keyed map */
export type JsonMap<T> = { [key: string]: T };

export type Decoder<T> = (value: Json) => T;

export type Encoder<T> = (value: T) => Json;

/** A JSON value didn't have the shape a generated type expects */
export class DecodeError extends Error {
  constructor(readonly typeName: string, detail: string) {
    super(typeName + ": " + detail);
    this.name = "DecodeError";
  }
}

function describe(value: Json | undefined): string {
  if (value === null) {
    return "null";
  }
  return Array.isArray(value) ? "array" : typeof value;
}

export function expectObject(value: Json, typeName: string): { [key: string]: Json } {
  if (typeof value !== "object" || value === null || Array.isArray(value)) {
    throw new DecodeError(typeName, "expected object, found " + describe(value));
  }
  return value;
}

export function field<T>(object: { [key: string]: Json }, typeName: string, key: string, decode: Decoder<T>): T {
  const value = object[key];
  if (value === undefined) {
    throw new DecodeError(typeName, "missing field `" + key + "`");
  }
  return decode(value);
}

export function optionalField<T>(object: { [key: string]: Json }, key: string, decode: Decoder<T>): T | undefined {
  const value = object[key];
  return value === undefined || value === null ? undefined : decode(value);
}

/** Every property not in `known` */
export function additional<T>(object: { [key: string]: Json }, known: string[], decode: Decoder<T>): JsonMap<T> {
  const out: JsonMap<T> = {};
  for (const [key, value] of Object.entries(object)) {
    if (!known.includes(key)) {
      out[key] = decode(value);
    }
  }
  return out;
}

/** Insert a discriminator into an encoded object */
export function withTag(value: Json, field: string, tag: string): Json {
  if (typeof value === "object" && value !== null && !Array.isArray(value)) {
    return { ...value, [field]: tag };
  }
  return value;
}

export function decodeString(value: Json): string {
  if (typeof value !== "string") {
    throw new DecodeError("string", "found " + describe(value));
  }
  return value;
}

export function decodeNumber(value: Json): number {
  if (typeof value !== "number") {
    throw new DecodeError("number", "found " + describe(value));
  }
  return value;
}

export function decodeInteger(value: Json): number {
  const number = decodeNumber(value);
  if (!Number.isInteger(number)) {
    throw new DecodeError("integer", "found " + number);
  }
  return number;
}

export function decodeBoolean(value: Json): boolean {
  if (typeof value !== "boolean") {
    throw new DecodeError("boolean", "found " + describe(value));
  }
  return value;
}

export function decodeNull(value: Json): null {
  if (value !== null) {
    throw new DecodeError("null", "found " + describe(value));
  }
  return null;
}

export function decodeJson(value: Json): Json {
  return value;
}

export function decodeArray<T>(decode: Decoder<T>): Decoder<T[]> {
  return (value) => {
    if (!Array.isArray(value)) {
      throw new DecodeError("array", "found " + describe(value));
    }
    return value.map(decode);
  };
}

export function decodeMap<T>(decode: Decoder<T>): Decoder<JsonMap<T>> {
  return (value) => additional(expectObject(value, "map"), [], decode);
}

export function decodeOptional<T>(decode: Decoder<T>): Decoder<T | undefined> {
  return (value) => (value === null ? undefined : decode(value));
}

/** Defers looking up a decoder until first use, for recursive types */
export function decodeLazy<T>(thunk: () => Decoder<T>): Decoder<T> {
  return (value) => thunk()(value);
}

export function encodeString(value: string): Json {
  return value;
}

export function encodeNumber(value: number): Json {
  return value;
}

export function encodeInteger(value: number): Json {
  return value;
}

export function encodeBoolean(value: boolean): Json {
  return value;
}

export function encodeNull(_value: null): Json {
  return null;
}

export function encodeJson(value: Json): Json {
  return value;
}

export function encodeArray<T>(encode: Encoder<T>): Encoder<T[]> {
  return (value) => value.map(encode);
}

export function encodeMap<T>(encode: Encoder<T>): Encoder<JsonMap<T>> {
  return (value) => {
    const out: { [key: string]: Json } = {};
    for (const [key, item] of Object.entries(value)) {
      out[key] = encode(item);
    }
    return out;
  };
}

export function encodeOptional<T>(encode: Encoder<T>): Encoder<T | undefined> {
  return (value) => (value === undefined ? null : encode(value));
}

export function encodeLazy<T>(thunk: () => Encoder<T>): Encoder<T> {
  return (value) => thunk()(value);
}"#;

const TRANSPORT: &str = r#"export type Result<T, E> = { ok: true; value: T } | { ok: false; error: E };

/** The request never produced a usable response */
export type TransportError =
  | { kind: "network"; message: string }
  | { kind: "invalidUrl"; message: string }
  | { kind: "decode"; status: number; message: string }
  | { kind: "status"; status: number; body: string };

export type OperationError<E> =
  | { kind: "transport"; error: TransportError }
  | { kind: "api"; error: E };

export function transportFailure<E>(error: TransportError): Result<never, OperationError<E>> {
  return { ok: false, error: { kind: "transport", error } };
}

/** Decode a response body; an empty body reads as `null` */
export function readBody<T>(text: string, decode: Decoder<T>): T {
  const value = text.trim() === "" ? null : (JSON.parse(text) as Json);
  return decode(value);
}

/** Parameter text: strings as-is, anything else as JSON */
export function paramText(value: Json): string {
  return typeof value === "string" ? value : JSON.stringify(value);
}

export async function send(
  url: URL,
  method: string,
  headers: { [name: string]: string },
  body: string | undefined,
  timeoutMs: number,
): Promise<Result<{ status: number; text: string }, TransportError>> {
  try {
    const response = await fetch(url, { method, headers, body, signal: AbortSignal.timeout(timeoutMs) });
    return { ok: true, value: { status: response.status, text: await response.text() } };
  } catch (error) {
    return { ok: false, error: { kind: "network", message: String(error) } };
  }
}"#;

/// Names a child module imports from the runtime
const CODEC_NAMES: &[&str] = &[
    "Json", "JsonMap", "Decoder", "Encoder", "DecodeError", "expectObject", "field",
    "optionalField", "additional", "withTag", "decodeString", "decodeNumber", "decodeInteger",
    "decodeBoolean", "decodeNull", "decodeJson", "decodeArray", "decodeMap", "decodeOptional",
    "decodeLazy", "encodeString", "encodeNumber", "encodeInteger", "encodeBoolean", "encodeNull",
    "encodeJson", "encodeArray", "encodeMap", "encodeOptional", "encodeLazy",
];

const TRANSPORT_NAMES: &[&str] = &[
    "Result", "TransportError", "OperationError", "transportFailure", "readBody", "paramText",
    "send",
];

pub(super) fn runtime(imports: &ImportSet) -> String {
    let mut sections = vec![CODEC.to_string()];
    sections.extend(imports.formats().map(format_alias));
    if imports.contains(Import::Http) {
        sections.push(TRANSPORT.to_string());
    }
    sections.join("\n\n")
}

pub(super) fn exported_names(imports: &ImportSet) -> Vec<String> {
    let mut names: Vec<String> = CODEC_NAMES.iter().map(|n| n.to_string()).collect();
    for format in imports.formats() {
        let ty = format.type_name();
        names.extend([ty.to_string(), format!("decode{ty}"), format!("encode{ty}")]);
    }
    if imports.contains(Import::Http) {
        names.extend(TRANSPORT_NAMES.iter().map(|n| n.to_string()));
    }
    names
}

/// Branded string for one `format`
fn format_alias(format: StringFormat) -> String {
    let name = format.type_name();
    let raw = format.raw();
    format!(
        "/** String in `{raw}` format */\n\
         export type {name} = string & {{ readonly __format: \"{raw}\" }};\n\n\
         export function decode{name}(value: Json): {name} {{\n\
         \x20 return decodeString(value) as {name};\n\
         }}\n\n\
         export function encode{name}(value: {name}): Json {{\n\
         \x20 return value;\n\
         }}"
    )
}
