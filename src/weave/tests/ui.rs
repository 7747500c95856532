use trybuild::TestCases;

#[test]
fn ui() {
    let testcase = TestCases::new();
    testcase.pass("tests/ui/pass/*.rs");
    testcase.compile_fail("tests/ui/fail/*.rs");
}
