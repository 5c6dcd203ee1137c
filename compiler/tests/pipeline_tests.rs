use rstest::rstest;

use tac_compiler::ast::{ExprKind, TensorLiteral};
use tac_compiler::lexer::tokenize;
use tac_compiler::parser::{parse, parse_traced, MAX_HEIGHT, MAX_NESTING};
use tac_compiler::symbol_table::{SymbolTable, VarKind, VarType};
use tac_compiler::{compile_to_text, ErrorKind};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn assert_codegen(src: &str, expected: &str) {
    init_logger();
    let got = compile_to_text(src).unwrap();
    assert_eq!(got, expected);
}

fn assert_error(src: &str, kind: ErrorKind) {
    init_logger();
    let err = compile_to_text(src).unwrap_err();
    assert_eq!(err.kind, kind, "source: {}", src);
}

fn strip_trivia(src: &str) -> String {
    src.lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .flat_map(|line| line.chars())
        .filter(|c| !c.is_whitespace())
        .collect()
}

#[test]
fn lexemes_reproduce_source_without_trivia() {
    let src = "# weights\nlet tensor w = {{1, 0.5}, {0, -2}};  # 2x2\n\
               let float s = (w * 3.) / .25;\n";
    let tokens = tokenize(src).unwrap();
    let joined: String = tokens.iter().map(|t| t.lexeme.as_str()).collect();
    assert_eq!(joined, strip_trivia(src));
    assert!(tokens.iter().all(|t| !t.lexeme.contains("weights")));
}

#[test]
fn digit_run_into_letter_is_lexical() {
    assert_error("let int x = 3x;", ErrorKind::Lexical);
}

#[test]
fn second_dot_starts_a_new_token() {
    let lexemes: Vec<String> = tokenize("3.14.5").unwrap().into_iter().map(|t| t.lexeme).collect();
    assert_eq!(lexemes, vec!["3.14", ".5", ""]);
}

#[test]
fn precedence_and_associativity_in_generated_code() {
    assert_codegen(
        "let int x = 1 + 2 * 3;",
        "push constant 1\npush constant 2\npush constant 3\nfmult\nfadd\npop local 0\n",
    );
    assert_codegen(
        "let int x = 8 / 4 / 2;",
        "push constant 8\npush constant 4\nfdiv\npush constant 2\nfdiv\npop local 0\n",
    );
}

#[test]
fn symbol_table_contract() {
    let mut table = SymbolTable::new();
    let before = table.running_index(VarKind::Local);
    table.define("x", VarType::Int, VarKind::Local);
    assert_eq!(table.index_of("x"), Some(before));
    assert_eq!(table.kind_of("y"), None);

    table.define("x", VarType::Float, VarKind::Local);
    assert_eq!(table.index_of("x"), Some(before + 1));
}

#[test]
fn float_addition() {
    assert_codegen(
        "let float y = 2.0 + 3.0;",
        "push constant 2\npush constant 3\nfadd\npop local 0\n",
    );
}

#[test]
fn later_declaration_reads_earlier_slot() {
    let (program, symbols) = parse("let int a = 5; let int b = a + 1;").unwrap();
    assert_eq!(symbols.index_of("a"), Some(0));
    assert_eq!(symbols.index_of("b"), Some(1));
    assert_eq!(program.declarations().count(), 2);

    assert_codegen(
        "let int a = 5; let int b = a + 1;",
        "push constant 5\npop local 0\npush local 0\npush constant 1\nfadd\npop local 1\n",
    );
}

#[test]
fn undeclared_name_fails_only_at_codegen() {
    assert!(parse("let int a = b;").is_ok());
    assert_error("let int a = b;", ErrorKind::IllegalIdentifier);
}

#[test]
fn self_reference_is_illegal() {
    assert!(parse("let int a = a;").is_ok());
    assert_error("let int a = a;", ErrorKind::IllegalIdentifier);
}

#[rstest]
#[case("{1.5, 0, 2}", 1, vec![(vec![0], 1.5), (vec![2], 2.0)])]
#[case("{{1, 0}, {0, 1}}", 2, vec![(vec![0, 0], 1.0), (vec![1, 1], 1.0)])]
#[case("{{{0, 4}}, {{0}, {5}}}", 3, vec![(vec![0, 0, 1], 4.0), (vec![1, 1, 0], 5.0)])]
#[case("{{{{-1}}}}", 4, vec![(vec![0, 0, 0, 0], -1.0)])]
#[case("{0, {0, 0}}", 2, vec![])]
fn tensor_literals(
    #[case] literal: &str,
    #[case] depth: usize,
    #[case] nonzeros: Vec<(Vec<usize>, f64)>,
) {
    let (program, _) = parse(&format!("let tensor t = {};", literal)).unwrap();
    let dec = program.declarations().next().unwrap();
    let ExprKind::Tensor(tensor) = &dec.rhs.kind else {
        panic!("Expected Tensor, got {:?}", dec.rhs.kind);
    };
    assert_eq!(tensor.depth(), depth);
    assert_eq!(tensor.nonzeros(), nonzeros);
}

#[test]
fn empty_braces_are_an_empty_node() {
    let (program, _) = parse("let tensor t = {};").unwrap();
    let dec = program.declarations().next().unwrap();
    assert_eq!(
        dec.rhs.kind,
        ExprKind::Tensor(TensorLiteral::Node {
            extent: 0,
            entries: vec![]
        })
    );
}

#[rstest]
#[case("let tensor t = {{1, 2};")]
#[case("let tensor t = {1, 2}};")]
#[case("let tensor t = 1, 2};")]
fn unbalanced_braces_are_syntax_errors(#[case] src: &str) {
    assert_error(src, ErrorKind::Syntax);
}

#[test]
fn trace_is_complete_up_to_failure() {
    let (result, trace) = parse_traced("let int a = 1;\nlet float b = (a + ;");
    assert_eq!(result.unwrap_err().kind, ErrorKind::Syntax);
    let text = trace.as_str();
    assert_eq!(text.matches("</var_dec>").count(), 1);
    assert!(text.contains("<symbol> + </symbol>"));
    assert!(text.trim_end().ends_with("<primary>"));
    assert!(!text.contains("</compilation_unit>"));
}

#[test]
fn error_renders_with_category() {
    let err = compile_to_text("let int a = b;").unwrap_err();
    assert_eq!(err.to_string(), "Semantic error: 'b' is not declared");
    assert!(err.kind.is_fatal());
}

#[test]
fn deepest_accepted_inputs_compile() {
    let parens = format!("let float x = {}2{};", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
    assert_codegen(&parens, "push constant 2\npop local 0\n");

    let negations = format!("let float x = {}2;", "-".repeat(MAX_NESTING));
    let code = compile_to_text(&negations).unwrap();
    assert_eq!(code.matches("fneg").count(), MAX_NESTING);

    let chain = format!("let int x = 1{};", " - 1".repeat(MAX_HEIGHT));
    let code = compile_to_text(&chain).unwrap();
    assert_eq!(code.matches("fsub").count(), MAX_HEIGHT);
}

#[rstest]
#[case("(", ")")]
#[case("{", "}")]
#[case("-", "")]
fn nesting_past_limit_fails_cleanly(#[case] open: &str, #[case] close: &str) {
    let depth = 20 * MAX_NESTING;
    let src = format!("let tensor t = {}1{};", open.repeat(depth), close.repeat(depth));
    assert_error(&src, ErrorKind::Syntax);
}

#[test]
fn huge_literal_is_rejected() {
    let src = format!("let int x = {};", "9".repeat(400));
    assert_error(&src, ErrorKind::Lexical);
}
