//! Net present value and internal rate of return of a profit signature
//!
//! Used by the IFRS4 report on annual profit series

/// Present value of `cashflows` at an annual rate; element `t` is discounted
/// `t + 1` periods (end-of-year cashflows)
pub fn npv(cashflows: &[f64], annual_rate: f64) -> f64 {
    cashflows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf / (1.0 + annual_rate).powi(t as i32 + 1))
        .sum()
}

/// Internal rate of return using Newton-Raphson, falling back to bisection.
///
/// # Arguments
/// * `cashflows` - cash flows from time 0 (positive = profit, negative = strain)
/// * `periods_per_year` - 1 for annual series, 12 for monthly
///
/// # Returns
/// * Annual IRR as a decimal, or `None` when the series has no sign change
///   or no root was found
pub fn calculate_irr(cashflows: &[f64], periods_per_year: u32) -> Option<f64> {
    if cashflows.is_empty() {
        return None;
    }

    if cashflows.iter().all(|&cf| cf.abs() < 1e-10) {
        return Some(0.0);
    }

    let has_positive = cashflows.iter().any(|&cf| cf > 1e-10);
    let has_negative = cashflows.iter().any(|&cf| cf < -1e-10);
    if !has_positive || !has_negative {
        return None;
    }

    let mut rate = 0.05 / periods_per_year as f64;
    let tolerance = 1e-10;
    let max_iterations = 1000;

    for _ in 0..max_iterations {
        let (value, derivative) = npv_and_derivative(cashflows, rate);

        if derivative.abs() < 1e-20 {
            return calculate_irr_bisection(cashflows, periods_per_year);
        }

        let new_rate = (rate - value / derivative).clamp(-0.99, 10.0);

        if (new_rate - rate).abs() < tolerance {
            return Some(annualise(new_rate, periods_per_year));
        }

        rate = new_rate;
    }

    calculate_irr_bisection(cashflows, periods_per_year)
}

fn annualise(periodic_rate: f64, periods_per_year: u32) -> f64 {
    (1.0 + periodic_rate).powi(periods_per_year as i32) - 1.0
}

/// NPV from time 0 and its derivative with respect to rate
fn npv_and_derivative(cashflows: &[f64], rate: f64) -> (f64, f64) {
    let mut value = 0.0;
    let mut derivative = 0.0;

    for (t, &cf) in cashflows.iter().enumerate() {
        value += cf / (1.0 + rate).powi(t as i32);
        if t > 0 {
            derivative -= (t as f64) * cf / (1.0 + rate).powi(t as i32 + 1);
        }
    }

    (value, derivative)
}

fn calculate_irr_bisection(cashflows: &[f64], periods_per_year: u32) -> Option<f64> {
    let mut low = -0.99_f64;
    let mut high = 10.0_f64;
    let tolerance = 1e-10;

    let mut value_low = npv_at_rate(cashflows, low);
    if value_low * npv_at_rate(cashflows, high) > 0.0 {
        return None;
    }

    for _ in 0..1000 {
        let mid = (low + high) / 2.0;
        let value_mid = npv_at_rate(cashflows, mid);

        if value_mid.abs() < tolerance || (high - low) / 2.0 < tolerance {
            return Some(annualise(mid, periods_per_year));
        }

        if value_mid * value_low < 0.0 {
            high = mid;
        } else {
            low = mid;
            value_low = value_mid;
        }
    }

    None
}

fn npv_at_rate(cashflows: &[f64], rate: f64) -> f64 {
    cashflows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf / (1.0 + rate).powi(t as i32))
        .sum()
}
