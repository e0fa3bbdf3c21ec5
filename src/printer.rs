use std::fmt::{self, Display, Write};

use smartstring::{LazyCompact, SmartString};

use crate::{
    rings::{
        linear_system::Matrix,
        rational::{Rational, RationalField},
        Field,
    },
    solve::{Expression, Reduction, Solution},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintOptions {
    /// Prefix of the generated variable names `x1`, `x2`, ...
    pub variable_prefix: SmartString<LazyCompact>,
    /// Prefix of the free parameters `t1`, `t2`, ...
    pub parameter_prefix: SmartString<LazyCompact>,
    pub column_separator: SmartString<LazyCompact>,
    /// Print the reduced matrix before the solution.
    pub print_matrix: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        PrintOptions {
            variable_prefix: "x".into(),
            parameter_prefix: "t".into(),
            column_separator: "\t".into(),
            print_matrix: true,
        }
    }
}

/// Prints a matrix one row per line as `[ a<sep>b<sep>c ]`.
pub struct MatrixPrinter<'a, F: Field> {
    pub matrix: &'a Matrix<F>,
    pub opts: &'a PrintOptions,
}

impl<'a, F: Field> MatrixPrinter<'a, F> {
    pub fn new(matrix: &'a Matrix<F>, opts: &'a PrintOptions) -> MatrixPrinter<'a, F> {
        MatrixPrinter { matrix, opts }
    }
}

impl<'a, F: Field> Display for MatrixPrinter<'a, F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (rows, cols) = self.matrix.shape;
        for r in 0..rows {
            f.write_str("[ ")?;
            for c in 0..cols {
                if c > 0 {
                    f.write_str(&self.opts.column_separator)?;
                }
                Display::fmt(&self.matrix[(r, c)], f)?;
            }
            f.write_str(" ]\n")?;
        }
        Ok(())
    }
}

/// Prints the solution set of a rational system.
///
/// Variables are named by `variables` when given, otherwise by the variable
/// prefix and their 1-based column.
pub struct SolutionPrinter<'a> {
    pub solution: &'a Solution<RationalField>,
    pub variables: Option<&'a [SmartString<LazyCompact>]>,
    pub opts: &'a PrintOptions,
}

impl<'a> SolutionPrinter<'a> {
    pub fn new(solution: &'a Solution<RationalField>, opts: &'a PrintOptions) -> SolutionPrinter<'a> {
        SolutionPrinter {
            solution,
            variables: None,
            opts,
        }
    }

    pub fn with_variables(mut self, variables: &'a [SmartString<LazyCompact>]) -> Self {
        self.variables = Some(variables);
        self
    }

    fn fmt_variable(&self, f: &mut fmt::Formatter, j: usize) -> fmt::Result {
        match self.variables.and_then(|v| v.get(j)) {
            Some(name) => f.write_str(name),
            None => write!(f, "{}{}", self.opts.variable_prefix, j + 1),
        }
    }

    fn fmt_expression(&self, f: &mut fmt::Formatter, e: &Expression<RationalField>) -> fmt::Result {
        Display::fmt(&e.constant, f)?;
        for (k, c) in &e.terms {
            f.write_str(if c.is_negative() { " - " } else { " + " })?;
            fmt_magnitude(f, c)?;
            write!(f, "*{}{}", self.opts.parameter_prefix, k + 1)?;
        }
        Ok(())
    }
}

/// Print `|r|` without negating, which could overflow for `i64::MIN`.
fn fmt_magnitude(f: &mut fmt::Formatter, r: &Rational) -> fmt::Result {
    let num = r.numerator().unsigned_abs();
    if r.is_integer() {
        write!(f, "{}", num)
    } else {
        write!(f, "{}/{}", num, r.denominator())
    }
}

impl<'a> Display for SolutionPrinter<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.solution {
            Solution::Inconsistent => f.write_str("NO SOLUTION\n"),
            Solution::Unique(values) => {
                f.write_str("UNIQUE SOLUTION:\n")?;
                for (j, v) in values.iter().enumerate() {
                    self.fmt_variable(f, j)?;
                    f.write_str(" = ")?;
                    Display::fmt(v, f)?;
                    f.write_char('\n')?;
                }
                Ok(())
            }
            Solution::Infinite {
                free_columns,
                expressions,
            } => {
                f.write_str("INFINITE SOLUTIONS\n")?;
                for (k, &j) in free_columns.iter().enumerate() {
                    self.fmt_variable(f, j as usize)?;
                    writeln!(f, " = {}{}", self.opts.parameter_prefix, k + 1)?;
                }

                for (j, e) in expressions.iter().enumerate() {
                    if free_columns.contains(&(j as u32)) {
                        continue;
                    }
                    self.fmt_variable(f, j)?;
                    f.write_str(" = ")?;
                    self.fmt_expression(f, e)?;
                    f.write_char('\n')?;
                }
                Ok(())
            }
        }
    }
}

/// Prints the reduced matrix followed by the solution, each section
/// preceded by an empty line.
pub struct ReportPrinter<'a> {
    pub reduction: &'a Reduction<RationalField>,
    pub variables: Option<&'a [SmartString<LazyCompact>]>,
    pub opts: &'a PrintOptions,
}

impl<'a> ReportPrinter<'a> {
    pub fn new(reduction: &'a Reduction<RationalField>, opts: &'a PrintOptions) -> ReportPrinter<'a> {
        ReportPrinter {
            reduction,
            variables: None,
            opts,
        }
    }

    pub fn with_variables(mut self, variables: &'a [SmartString<LazyCompact>]) -> Self {
        self.variables = Some(variables);
        self
    }
}

impl<'a> Display for ReportPrinter<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.opts.print_matrix {
            f.write_str("\nRREF:\n")?;
            Display::fmt(&MatrixPrinter::new(&self.reduction.matrix, self.opts), f)?;
        }

        let mut solution = SolutionPrinter::new(&self.reduction.solution, self.opts);
        if let Some(v) = self.variables {
            solution = solution.with_variables(v);
        }
        write!(f, "\n{}", solution)
    }
}
