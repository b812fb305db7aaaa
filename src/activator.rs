//! Activation function types.

/// [Activation function](https://en.wikipedia.org/wiki/Activation_function)
/// types.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Activator {
    /// Sigmoid (logistic) function
    Sigmoid,
    /// Inverse tangent function
    ArcTan,
    /// Hyperbolic tan function
    TanH,
    /// Identity function
    Identity,
}

impl Activator {
    /// Evaluates `f(z)` for the selected activation function.
    pub fn f(&self, z: f64) -> f64 {
        match self {
            &Activator::Sigmoid => 1.0 / (1.0 + (-z).exp()),
            &Activator::ArcTan => z.atan(),
            &Activator::TanH => z.tanh(),
            &Activator::Identity => z,
        }
    }

    /// Evaluates the derivative `f'(z)` at the pre-activation `z`.
    ///
    /// Note that this takes the *input* of the activation function. The
    /// backward pass stores the pre-activation matrices and evaluates the
    /// derivatives there, so there is no shortcut through the activated
    /// output.
    pub fn fprime(&self, z: f64) -> f64 {
        match self {
            &Activator::Sigmoid => {
                let y = self.f(z);
                y * (1.0 - y)
            }
            &Activator::ArcTan => 1.0 / (1.0 + z * z),
            &Activator::TanH => {
                let y = z.tanh();
                1.0 - y * y
            }
            &Activator::Identity => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTIVATORS: [Activator; 4] = [
        Activator::Sigmoid,
        Activator::ArcTan,
        Activator::TanH,
        Activator::Identity,
    ];

    #[test]
    fn sigmoid_values() {
        assert!((Activator::Sigmoid.f(0.0) - 0.5).abs() < 1e-12);
        assert!(Activator::Sigmoid.f(10.0) > 0.9999);
        assert!(Activator::Sigmoid.f(-10.0) < 0.0001);
    }

    #[test]
    fn derivatives_match_finite_differences() {
        let e = 1e-6;
        for activator in &ACTIVATORS {
            let mut z = -1.5;
            while z < 1.5 {
                let numeric =
                    (activator.f(z + e) - activator.f(z - e)) / (2.0 * e);
                assert!(
                    (activator.fprime(z) - numeric).abs() < 1e-8,
                    "{:?} derivative mismatch at z={}",
                    activator,
                    z
                );
                z += 0.25;
            }
        }
    }
}
