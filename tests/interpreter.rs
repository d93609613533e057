#[cfg(test)]
mod interpreter_tests {
    use treelox as lox;

    use lox::error::LoxError;
    use lox::interpreter::Interpreter;
    use lox::parser::Parser;
    use lox::resolver::Resolver;
    use lox::scanner::Scanner;

    /// Run a program through the full pipeline against a byte-buffer writer.
    /// Returns everything `print` produced plus the runtime error, if any.
    fn run(source: &str) -> (String, Option<LoxError>) {
        let (tokens, lex_errors) = Scanner::new(source.as_bytes()).scan();
        assert!(lex_errors.is_empty(), "lex errors: {:?}", lex_errors);

        let (statements, parse_errors) = Parser::new(tokens).parse();
        assert!(parse_errors.is_empty(), "parse errors: {:?}", parse_errors);

        let (locals, resolve_errors) = Resolver::new().resolve(&statements);
        assert!(
            resolve_errors.is_empty(),
            "resolve errors: {:?}",
            resolve_errors
        );

        let mut interpreter = Interpreter::with_writer(Vec::new());
        interpreter.resolve(locals);

        let err = interpreter.interpret(&statements).err();
        let output = String::from_utf8(interpreter.output().clone()).expect("utf-8 output");

        (output, err)
    }

    fn run_ok(source: &str) -> String {
        let (output, err) = run(source);
        assert!(err.is_none(), "unexpected runtime error: {:?}", err);
        output
    }

    fn run_err(source: &str) -> (String, String) {
        let (output, err) = run(source);
        let err = err.expect("expected a runtime error");
        (output, err.to_string())
    }

    // ───────────────────────── values and printing ─────────────────────

    #[test]
    fn test_interp_01_literals_print() {
        assert_eq!(run_ok("print nil;"), "nil\n");
        assert_eq!(run_ok("print true;"), "true\n");
        assert_eq!(run_ok("print false;"), "false\n");
        assert_eq!(run_ok("print \"hi\";"), "hi\n");
    }

    #[test]
    fn test_interp_02_integral_numbers_drop_the_point() {
        assert_eq!(run_ok("print 7;"), "7\n");
        assert_eq!(run_ok("print 7.0;"), "7\n");
        assert_eq!(run_ok("print 2.5;"), "2.5\n");
        assert_eq!(run_ok("print -0.5;"), "-0.5\n");
    }

    #[test]
    fn test_interp_03_arithmetic_and_concat() {
        assert_eq!(run_ok("print 1 + 2 * 3 - 4 / 2;"), "5\n");
        assert_eq!(run_ok("print \"foo\" + \"bar\";"), "foobar\n");
        assert_eq!(run_ok("print -(3 + 2);"), "-5\n");
    }

    #[test]
    fn test_interp_04_division_by_zero_is_ieee() {
        assert_eq!(run_ok("print 1 / 0;"), "inf\n");
        assert_eq!(run_ok("print -1 / 0;"), "-inf\n");
        assert_eq!(run_ok("print 0 / 0;"), "NaN\n");
    }

    #[test]
    fn test_interp_05_comparisons_and_equality() {
        assert_eq!(run_ok("print 1 < 2;"), "true\n");
        assert_eq!(run_ok("print 2 <= 2;"), "true\n");
        assert_eq!(run_ok("print 1 > 2;"), "false\n");
        assert_eq!(run_ok("print \"a\" == \"a\";"), "true\n");
        assert_eq!(run_ok("print 1 == \"1\";"), "false\n");
        assert_eq!(run_ok("print nil == nil;"), "true\n");
        assert_eq!(run_ok("print nil != false;"), "true\n");
    }

    #[test]
    fn test_interp_06_truthiness() {
        // Only nil and false are falsey; 0 and "" are truthy.
        assert_eq!(run_ok("if (0) print \"yes\"; else print \"no\";"), "yes\n");
        assert_eq!(run_ok("if (\"\") print \"yes\"; else print \"no\";"), "yes\n");
        assert_eq!(run_ok("if (nil) print \"yes\"; else print \"no\";"), "no\n");
        assert_eq!(run_ok("print !0;"), "false\n");
        assert_eq!(run_ok("print !nil;"), "true\n");
    }

    // ───────────────────────── evaluation order ────────────────────────

    #[test]
    fn test_interp_07_binary_evaluates_right_before_left() {
        let source = "\
fun side(x) { print x; return x; }
var total = side(1) + side(2);
print total;";

        assert_eq!(run_ok(source), "2\n1\n3\n");
    }

    #[test]
    fn test_interp_08_arguments_evaluate_right_to_left_bind_positionally() {
        let source = "\
fun side(x) { print x; return x; }
fun pair(a, b) { print a; print b; }
pair(side(1), side(2));";

        // Evaluation prints 2 then 1; binding is still positional.
        assert_eq!(run_ok(source), "2\n1\n1\n2\n");
    }

    #[test]
    fn test_interp_09_logical_short_circuit_returns_operand() {
        assert_eq!(run_ok("print \"a\" or \"b\";"), "a\n");
        assert_eq!(run_ok("print nil or \"b\";"), "b\n");
        assert_eq!(run_ok("print nil and \"b\";"), "nil\n");
        assert_eq!(run_ok("print 1 and 2;"), "2\n");

        // The right operand is not touched when the left decides.
        let source = "\
fun boom() { print \"boom\"; return true; }
print true or boom();
print false and boom();";
        assert_eq!(run_ok(source), "true\nfalse\n");
    }

    // ───────────────────────── variables and scope ─────────────────────

    #[test]
    fn test_interp_10_var_default_and_assignment_value() {
        assert_eq!(run_ok("var a; print a;"), "nil\n");
        assert_eq!(run_ok("var a = 1; print a = 2;"), "2\n");
    }

    #[test]
    fn test_interp_11_block_scoping_and_shadowing() {
        let source = "\
var a = \"outer\";
{
  var a = \"inner\";
  print a;
}
print a;";

        assert_eq!(run_ok(source), "inner\nouter\n");
    }

    #[test]
    fn test_interp_12_assignment_writes_through_to_outer_scope() {
        let source = "\
var a = 1;
{
  a = 2;
}
print a;";

        assert_eq!(run_ok(source), "2\n");
    }

    #[test]
    fn test_interp_13_while_and_for_loops() {
        let source = "\
var sum = 0;
var i = 1;
while (i <= 4) {
  sum = sum + i;
  i = i + 1;
}
print sum;
for (var j = 0; j < 3; j = j + 1) print j;";

        assert_eq!(run_ok(source), "10\n0\n1\n2\n");
    }

    // ───────────────────────── functions and closures ──────────────────

    #[test]
    fn test_interp_14_function_values_print() {
        assert_eq!(run_ok("fun f() {} print f;"), "<fn f >\n");
        assert_eq!(run_ok("print clock;"), "<native fn>\n");
    }

    #[test]
    fn test_interp_15_implicit_and_bare_return_yield_nil() {
        let source = "\
fun nothing() {}
fun early() { return; }
print nothing();
print early();";

        assert_eq!(run_ok(source), "nil\nnil\n");
    }

    #[test]
    fn test_interp_16_return_unwinds_through_loops() {
        let source = "\
fun firstOver(limit) {
  for (var i = 0;; i = i + 1) {
    if (i > limit) return i;
  }
}
print firstOver(3);";

        assert_eq!(run_ok(source), "4\n");
    }

    #[test]
    fn test_interp_17_recursion() {
        let source = "\
fun fib(n) {
  if (n < 2) return n;
  return fib(n - 1) + fib(n - 2);
}
print fib(10);";

        assert_eq!(run_ok(source), "55\n");
    }

    #[test]
    fn test_interp_18_closures_capture_by_reference() {
        let source = "\
fun makeCounter() {
  var i = 0;
  fun count() {
    i = i + 1;
    print i;
  }
  return count;
}
var counter = makeCounter();
counter();
counter();";

        assert_eq!(run_ok(source), "1\n2\n");
    }

    #[test]
    fn test_interp_19_two_closures_share_one_cell() {
        let source = "\
fun makePair() {
  var n = 0;
  fun bump() { n = n + 1; }
  fun read() { print n; }
  bump();
  bump();
  read();
}
makePair();";

        assert_eq!(run_ok(source), "2\n");
    }

    #[test]
    fn test_interp_20_static_binding_survives_shadowing() {
        let source = "\
var a = \"global\";
{
  fun show() { print a; }
  show();
  var a = \"block\";
  show();
}";

        // The closure keeps seeing the binding it resolved against.
        assert_eq!(run_ok(source), "global\nglobal\n");
    }

    #[test]
    fn test_interp_21_clock_native() {
        assert_eq!(run_ok("print clock() >= 0;"), "true\n");
        assert_eq!(run_ok("print clock() <= clock();"), "true\n");
    }

    // ───────────────────────── classes ─────────────────────────────────

    #[test]
    fn test_interp_22_class_and_instance_print() {
        let source = "\
class Bagel {}
print Bagel;
print Bagel();";

        assert_eq!(run_ok(source), "Bagel\nBagel instance\n");
    }

    #[test]
    fn test_interp_23_fields_are_per_instance() {
        let source = "\
class Box {}
var a = Box();
var b = Box();
a.label = \"first\";
b.label = \"second\";
print a.label;
print b.label;";

        assert_eq!(run_ok(source), "first\nsecond\n");
    }

    #[test]
    fn test_interp_24_methods_and_this() {
        let source = "\
class Cake {
  taste() {
    print \"The \" + this.flavor + \" cake is delicious!\";
  }
}
var cake = Cake();
cake.flavor = \"German chocolate\";
cake.taste();";

        assert_eq!(
            run_ok(source),
            "The German chocolate cake is delicious!\n"
        );
    }

    #[test]
    fn test_interp_25_bound_method_keeps_its_receiver() {
        let source = "\
class Person {
  sayName() { print this.name; }
}
var jane = Person();
jane.name = \"Jane\";
var method = jane.sayName;
method();";

        assert_eq!(run_ok(source), "Jane\n");
    }

    #[test]
    fn test_interp_26_fields_shadow_methods() {
        let source = "\
class Thing {
  describe() { print \"method\"; }
}
var t = Thing();
t.describe = 42;
print t.describe;";

        assert_eq!(run_ok(source), "42\n");
    }

    #[test]
    fn test_interp_27_initializer_runs_and_yields_the_instance() {
        let source = "\
class Point {
  init(x, y) {
    this.x = x;
    this.y = y;
  }
}
var p = Point(3, 4);
print p.x;
print p.y;
print p;";

        assert_eq!(run_ok(source), "3\n4\nPoint instance\n");
    }

    #[test]
    fn test_interp_28_bare_return_in_init_still_yields_this() {
        let source = "\
class Foo {
  init() {
    this.ready = true;
    return;
    this.ready = false;
  }
}
var f = Foo();
print f.ready;
print f;";

        assert_eq!(run_ok(source), "true\nFoo instance\n");
    }

    #[test]
    fn test_interp_29_calling_init_directly_returns_this() {
        let source = "\
class Foo {
  init() { this.n = 1; }
}
var f = Foo();
print f.init();";

        assert_eq!(run_ok(source), "Foo instance\n");
    }

    #[test]
    fn test_interp_30_set_evaluates_object_before_value() {
        let source = "\
class Box {}
fun side(x) { print x; return x; }
fun pick(b) { print \"object\"; return b; }
var b = Box();
pick(b).value = side(7);
print b.value;";

        assert_eq!(run_ok(source), "object\n7\n7\n");
    }

    // ───────────────────────── runtime errors ──────────────────────────

    #[test]
    fn test_interp_31_undefined_variable() {
        let (_, err) = run_err("print ghost;");
        assert!(err.contains("Undefined variable 'ghost'."));
        assert!(err.contains("[line 1]"));
    }

    #[test]
    fn test_interp_32_undefined_assignment_target() {
        let (_, err) = run_err("ghost = 1;");
        assert!(err.contains("Undefined variable 'ghost'."));
    }

    #[test]
    fn test_interp_33_unary_type_error() {
        let (_, err) = run_err("print -\"muffin\";");
        assert!(err.contains("Operand must be a number."));
    }

    #[test]
    fn test_interp_34_binary_type_errors_name_the_operator() {
        let (_, err) = run_err("print \"a\" - 1;");
        assert!(err.contains("Operands must be numbers for '-'."));

        let (_, err) = run_err("print 1 < \"two\";");
        assert!(err.contains("Operands must be numbers for '<'."));

        let (_, err) = run_err("print \"a\" + 1;");
        assert!(err.contains("Operands must be two numbers or two strings."));
    }

    #[test]
    fn test_interp_35_calling_a_non_callable() {
        let (_, err) = run_err("var x = 1;\nx();");
        assert!(err.contains("Can only call functions and classes."));
        assert!(err.contains("[line 2]"));
    }

    #[test]
    fn test_interp_36_arity_mismatch() {
        let (_, err) = run_err("fun f() {}\nf(1);");
        assert!(err.contains("Expected 0 arguments but got 1."));

        let (_, err) = run_err("fun g(a, b) {}\ng(1);");
        assert!(err.contains("Expected 2 arguments but got 1."));

        // Constructor arity comes from init.
        let (_, err) = run_err("class P { init(x, y) {} }\nP(1);");
        assert!(err.contains("Expected 2 arguments but got 1."));

        let (_, err) = run_err("class Q {}\nQ(1);");
        assert!(err.contains("Expected 0 arguments but got 1."));
    }

    #[test]
    fn test_interp_37_property_access_on_non_instance() {
        let (_, err) = run_err("print \"str\".length;");
        assert!(err.contains("Only instances have properties."));

        let (_, err) = run_err("var x = 1;\nx.field = 2;");
        assert!(err.contains("Only instances have fields."));
    }

    #[test]
    fn test_interp_38_undefined_property() {
        let (_, err) = run_err("class Foo {}\nvar f = Foo();\nprint f.bar;");
        assert!(err.contains("Undefined property 'bar'."));
    }

    #[test]
    fn test_interp_39_error_keeps_earlier_output() {
        let (output, err) = run_err("print \"before\";\nboom();\nprint \"after\";");

        // Effects already performed stay; later statements never run.
        assert_eq!(output, "before\n");
        assert!(err.contains("Undefined variable 'boom'."));
    }
}
