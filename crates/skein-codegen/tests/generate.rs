use skein_codegen::assemble::{Layout, UnitRole};
use skein_codegen::backend::{self, Backend, RustBackend, Template, TypeScriptBackend};
use skein_codegen::diagnostics::IssueKind;
use skein_codegen::document::Document;
use skein_codegen::error::CodegenError;
use skein_codegen::generator::{Generation, Generator, GeneratorOptions};
use skein_codegen::loader::parse_document;
use skein_codegen::output::{WriteOutcome, write_units};

const USERS: &str = include_str!("fixtures/users.yaml");
const PETSTORE: &str = include_str!("fixtures/petstore-swagger.json");

fn users() -> Document {
    parse_document(USERS, "users.yaml").expect("users fixture parses")
}

fn options() -> GeneratorOptions {
    GeneratorOptions {
        generated_at: Some("2024-05-01T12:00:00Z".into()),
        ..Default::default()
    }
}

fn generate(backend: &dyn Backend, doc: &Document) -> Generation {
    Generator::new(backend)
        .with_options(options())
        .generate(doc)
        .expect("generation succeeds")
}

fn single_source(generation: &Generation) -> &str {
    assert_eq!(generation.layout, Layout::Single);
    assert_eq!(generation.units.len(), 1);
    &generation.units[0].source
}

#[test]
fn rust_module_for_users() {
    let generation = generate(&RustBackend, &users());
    let source = single_source(&generation);

    assert!(source.starts_with("// @generated by skein"));
    assert!(source.contains("Generated at 2024-05-01T12:00:00Z"));
    assert!(source.contains("/// A registered account"));
    assert!(source.contains("pub struct User {"));
    assert!(source.contains("pub id: i64,"));
    assert!(source.contains("pub name: String,"));
    assert!(source.contains("pub async fn get_user("));
    assert!(source.contains("pub enum GetUserError {"));
    assert!(source.contains("base_url: \"https://api.example.com/v1\".to_owned(),"));
    assert!(generation.units[0].validation.is_ok());
}

#[test]
fn open_map_object_keeps_one_field() {
    let generation = generate(&RustBackend, &users());
    let source = single_source(&generation);
    assert!(source.contains("pub struct Labels {"));
    assert!(source.contains("pub additional_properties: BTreeMap<String, String>,"));
}

#[test]
fn recursive_schema_is_boxed() {
    let generation = generate(&RustBackend, &users());
    let source = single_source(&generation);
    assert!(source.contains("pub struct TreeNode {"));
    assert!(source.contains("Box<TreeNode>"));
}

#[test]
fn recursive_array_alias_is_a_newtype() {
    let generation = generate(&RustBackend, &users());
    let source = single_source(&generation);
    assert!(source.contains("pub struct Forest(pub Vec<Box<Forest>>);"));
    assert!(!source.contains("pub type Forest"));

    let generation = generate(&TypeScriptBackend, &users());
    assert!(generation.units[0].source.contains("export type Forest = Array<Forest>;"));
}

#[test]
fn no_content_success_is_optional() {
    let generation = generate(&RustBackend, &users());
    let source = single_source(&generation);
    assert!(source.contains("pub async fn latest_tree("));
    assert!(source.contains("Result<Option<TreeNode>, TransportError>"));
    assert!(source.contains("200 => Ok(decode_body::<Option<TreeNode>>(status, &text)?)"));
    assert!(source.contains("204 => Ok(None)"));
}

#[test]
fn cookie_parameters_stay_out_of_signatures() {
    let generation = generate(&RustBackend, &users());
    let source = single_source(&generation);
    assert!(source.contains("pub async fn get_forest("));
    assert!(!source.contains("session"));
}

#[test]
fn all_of_merges_into_one_struct() {
    let generation = generate(&RustBackend, &users());
    let source = single_source(&generation);
    let start = source.find("pub struct Animal {").expect("Animal declared");
    let end = start + source[start..].find('}').expect("struct closes");
    let body = &source[start..end];
    assert!(body.contains("pub id: String,"));
    assert!(body.contains("pub legs: Option<i64>,"));
}

#[test]
fn discriminated_union_rejects_unknown_tags() {
    let generation = generate(&RustBackend, &users());
    let source = single_source(&generation);
    assert!(source.contains("pub enum Pet {"));
    assert!(source.contains("Cat(Cat),"));
    assert!(source.contains("Dog(Dog),"));
    assert!(source.contains("DecodeError::UnknownDiscriminator"));
}

#[test]
fn unreachable_schemas_are_dropped() {
    let generation = generate(&RustBackend, &users());
    assert!(!generation.reachable.contains("Orphan"));
    assert!(!single_source(&generation).contains("Orphan"));
}

#[test]
fn one_codec_impl_per_type() {
    let generation = generate(&RustBackend, &users());
    let source = single_source(&generation);
    for name in ["User", "Labels", "TreeNode", "Forest", "Pet", "Animal"] {
        let decode = format!("impl Decode for {name} {{");
        let encode = format!("impl Encode for {name} {{");
        assert_eq!(source.matches(&decode).count(), 1, "{decode}");
        assert_eq!(source.matches(&encode).count(), 1, "{encode}");
    }
}

#[test]
fn missing_operation_id_gets_stable_name() {
    let doc = users();
    let first = generate(&RustBackend, &doc);
    let second = generate(&RustBackend, &doc);
    assert!(single_source(&first).contains("pub async fn get_ping("));
    assert_eq!(first.units[0].source, second.units[0].source);
    assert!(
        first
            .diagnostics
            .of_kind(IssueKind::MissingOperationField)
            .any(|issue| issue.location().contains("/ping"))
    );
}

#[test]
fn header_without_description_has_no_dangling_colon() {
    let doc = parse_document(
        "openapi: 3.0.0\ninfo:\n  title: Bare\n  version: \"1\"\npaths: {}\n",
        "bare.yaml",
    )
    .expect("bare document parses");

    let generation = generate(&RustBackend, &doc);
    let headers: Vec<_> = single_source(&generation)
        .lines()
        .filter(|line| line.starts_with("//! `"))
        .collect();
    assert_eq!(headers.len(), 1);
    assert!(headers[0].ends_with('`'), "{}", headers[0]);

    let generation = generate(&TypeScriptBackend, &doc);
    let headers: Vec<_> = single_source(&generation)
        .lines()
        .filter(|line| line.starts_with(" * `"))
        .collect();
    assert_eq!(headers.len(), 1);
    assert!(headers[0].ends_with('`'), "{}", headers[0]);
}

#[test]
fn swagger_document_with_api_key() {
    let doc = parse_document(PETSTORE, "petstore-swagger.json").expect("petstore parses");
    let generation = generate(&RustBackend, &doc);
    let source = single_source(&generation);
    assert!(source.contains("base_url: \"https://petstore.example.com/v2\".to_owned(),"));
    assert!(source.contains("\"YOUR_API_KEY\".to_owned()"));
    assert!(source.contains("pub async fn get_pet_by_id("));
    assert!(source.contains("pub enum StatusEnum {"));
}

#[test]
fn typescript_module_for_users() {
    let generation = generate(&TypeScriptBackend, &users());
    let unit = &generation.units[0];
    assert_eq!(unit.relative_path, std::path::Path::new("api.ts"));

    let source = single_source(&generation);
    assert!(source.starts_with("// @generated by skein"));
    assert!(source.contains("export interface User {"));
    assert!(source.contains("export function decodeUser(value: Json): User {"));
    assert!(source.contains("export function encodeUser(value: User): Json {"));
    assert!(source.contains("export async function getUser("));
    assert!(source.contains("export interface ClientConfig {"));
    assert!(source.contains("export class DecodeError extends Error {"));
    assert!(unit.validation.is_ok(), "{:?}", unit.validation.problems);
}

#[test]
fn module_prefix_override() {
    let generation = Generator::new(&RustBackend)
        .with_options(GeneratorOptions {
            module_prefix: Some("users_api".into()),
            ..options()
        })
        .generate(&users())
        .expect("generation succeeds");
    let unit = generation.unit("users_api").expect("root unit");
    assert_eq!(unit.role, UnitRole::Single);
    assert_eq!(unit.relative_path, std::path::Path::new("users_api.rs"));
}

#[test]
fn custom_template_must_keep_placeholders() {
    let err = Template::parse("{{ types }}\n{{ requests }}", "custom.tera").unwrap_err();
    match err {
        CodegenError::TemplateMissingPlaceholder { missing, .. } => {
            assert!(missing.contains(&"runtime".to_string()));
            assert!(missing.contains(&"decoders".to_string()));
            assert!(!missing.contains(&"types".to_string()));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn unknown_target_lists_backends() {
    let err = backend::by_name("cobol").err().expect("no cobol backend");
    match err {
        CodegenError::UnknownTarget { name, available } => {
            assert_eq!(name, "cobol");
            assert!(available.contains(&"rust".to_string()));
            assert!(available.contains(&"typescript".to_string()));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn writer_skips_existing_files_unless_forced() {
    let dir = tempfile::tempdir().expect("tempdir");
    let generation = generate(&RustBackend, &users());

    let first = write_units(dir.path(), &generation.units, false).expect("first write");
    assert_eq!(first.written().count(), 1);
    let path = dir.path().join("api.rs");
    assert!(std::fs::read_to_string(&path).expect("written").contains("pub struct User {"));

    std::fs::write(&path, "// edited by hand").expect("edit");
    let second = write_units(dir.path(), &generation.units, false).expect("second write");
    assert_eq!(second.outcomes, vec![WriteOutcome::Skipped(path.clone())]);
    assert_eq!(std::fs::read_to_string(&path).expect("kept"), "// edited by hand");

    let forced = write_units(dir.path(), &generation.units, true).expect("forced write");
    assert_eq!(forced.outcomes, vec![WriteOutcome::Written(path.clone())]);
    assert!(std::fs::read_to_string(&path).expect("rewritten").contains("pub struct User {"));
}
