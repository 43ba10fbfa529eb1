// End-to-end run of the conformance program. Every assertion in the fixture
// prints either "<code> => <value>" or an "expected but got" failure line
// followed by exit(1), so a zero status with a trailing "OK" means the whole
// suite passed inside the interpreter.

use subc::interpreter::engine::Interpreter;
use subc::parser::parse::Parser;

#[test]
fn conformance_fixture_passes() {
    let source = include_str!("programs/conformance.c");

    let mut parser = Parser::new(source).expect("lexing failed");
    let program = parser.parse_program().expect("parsing failed");

    let mut interpreter = Interpreter::new(program).expect("loading failed");
    let status = interpreter.run().expect("evaluation failed");

    let output = interpreter.output();
    assert!(
        !output.contains("expected but got"),
        "fixture assertions failed:\n{}",
        output
    );
    assert!(output.ends_with("OK\n"), "unexpected output:\n{}", output);
    assert_eq!(status, 0);
}
