quick_error! {
    #[derive(Debug, Clone, PartialEq)]
    pub enum Error {
        /// A stage (or a converter holding it) has no inverse
        NotInvertible(stage: String) {
            display("{} is not invertible", stage)
        }
        /// Output dimension of a stage does not match the input of the next one
        IncompatibleStages(from: String, to: String) {
            display("Incompatible adjacent components: {} -> {}", from, to)
        }
        DimensionMismatch(stage: &'static str, expected: usize, found: usize) {
            display("{} expects a {}-d point, got a {}-d one", stage, expected, found)
        }
        /// An iterative inversion exhausted its iteration budget
        NotConverged(stage: &'static str, iterations: usize) {
            display("{} did not converge after {} iterations", stage, iterations)
        }
        /// The point has no image under the projection
        OffProjection(proj: &'static str) {
            display("Point is off the {} projection", proj)
        }
        UnknownCoordinateSystem(name: String) {
            display("Unknown coordinate system: {}", name)
        }
        UnknownComponent(kind: &'static str, name: String) {
            display("Unknown {}: {}", kind, name)
        }
        InvalidSetting(key: String, value: String) {
            display("Invalid value for setting {}: {}", key, value)
        }
        MissingSetting(key: String) {
            display("Missing setting: {}", key)
        }
        MandatoryWCSKeywordsMissing(keyword: &'static str) {
            display("Mandatory keyword {} is missing", keyword)
        }
        InvalidImage(name: String, reason: String) {
            display("Invalid image {}: {}", name, reason)
        }
        Survey(msg: String) {
            display("Survey error: {}", msg)
        }
        NoValidPixels {
            display("No valid pixels found in mosaicker")
        }
    }
}
